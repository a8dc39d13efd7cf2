//! Loan eligibility evaluation
//!
//! Pure decision over a reader's standing and open-loan count. Every
//! applicable reason is reported, in a fixed order, so the desk can show all
//! blocking causes at once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::{CirculationError, IneligibilityReason};
use crate::models::{LibraryPolicy, Reader};

/// Outcome of an eligibility evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Eligibility {
    pub eligible: bool,
    pub reasons: Vec<IneligibilityReason>,
}

impl Eligibility {
    /// Convert a rejection into the matching error
    pub fn into_result(self) -> Result<(), CirculationError> {
        if self.eligible {
            Ok(())
        } else {
            Err(CirculationError::NotEligible(self.reasons))
        }
    }
}

/// Decide whether `reader` may start another loan under `policy`.
///
/// The loan ceiling is inclusive: a reader holding `max_open_loans` open
/// loans is refused, one below it is accepted.
pub fn evaluate(
    reader: &Reader,
    open_loans: i64,
    policy: &LibraryPolicy,
    now: DateTime<Utc>,
) -> Eligibility {
    let mut reasons = Vec::new();

    if !reader.active {
        reasons.push(IneligibilityReason::ReaderInactive);
    }
    if reader.is_blocked_at(now) {
        reasons.push(IneligibilityReason::ReaderBlocked);
    }
    if open_loans >= i64::from(policy.max_open_loans) {
        reasons.push(IneligibilityReason::LoanLimitReached);
    }

    Eligibility {
        eligible: reasons.is_empty(),
        reasons,
    }
}
