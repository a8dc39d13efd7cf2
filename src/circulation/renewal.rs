//! Renewal policy
//!
//! A renewal pushes the due date forward by the owning library's loan
//! period, counted from the current due date rather than from "now", so a
//! loan renewed while overdue keeps the lateness it already accrued. The
//! period is read at renewal time; earlier renewals are never recomputed.

use chrono::{DateTime, Utc};

use super::error::CirculationError;
use crate::models::{LibraryPolicy, Loan};

/// Upper bound on renewals of a single loan
pub const MAX_RENEWALS: i16 = 2;

/// Before/after of an accepted renewal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    pub previous_due_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub renewal_count: i16,
}

/// Compute the renewal of `loan` under `policy`, or refuse it
pub fn renew(loan: &Loan, policy: &LibraryPolicy) -> Result<Renewal, CirculationError> {
    if !loan.is_open() {
        return Err(CirculationError::LoanNotOpen(loan.id));
    }
    if loan.renewal_count >= MAX_RENEWALS {
        return Err(CirculationError::RenewalLimitReached(loan.id));
    }
    policy.ensure_valid()?;

    Ok(Renewal {
        previous_due_date: loan.due_date,
        due_date: loan.due_date + policy.loan_period(),
        renewal_count: loan.renewal_count + 1,
    })
}
