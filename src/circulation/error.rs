//! Circulation error taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Why a reader may not start a new loan. Declaration order is reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    ReaderInactive,
    ReaderBlocked,
    LoanLimitReached,
}

impl std::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IneligibilityReason::ReaderInactive => "reader account is inactive",
            IneligibilityReason::ReaderBlocked => "reader is blocked",
            IneligibilityReason::LoanLimitReached => "open loan limit reached",
        };
        write!(f, "{}", label)
    }
}

/// Typed failure of a circulation operation.
///
/// Lost races on a copy or loan surface as the same kinds as ordinary
/// precondition failures (`CopyUnavailable`, `LoanNotOpen`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CirculationError {
    #[error("Reader is not eligible: {}", format_reasons(.0))]
    NotEligible(Vec<IneligibilityReason>),

    #[error("Copy {0} is not available")]
    CopyUnavailable(i32),

    #[error("Loan {0} has reached the maximum number of renewals")]
    RenewalLimitReached(i32),

    #[error("Loan {0} is not open")]
    LoanNotOpen(i32),

    #[error("Reader {0} not found")]
    ReaderNotFound(i32),

    #[error("Copy {0} not found")]
    CopyNotFound(i32),

    #[error("Loan {0} not found")]
    LoanNotFound(i32),

    #[error("Copy {0} has no open loan")]
    CopyNotOnLoan(i32),

    #[error("Loan {0} was already reminded today")]
    ReminderThrottled(i32),

    #[error("Loan policy of library {0} is invalid")]
    InvalidPolicy(i32),

    #[error("A valid acting staff member is required")]
    ActorRequired,

    #[error("Audit recording failed: {0}")]
    AuditRecordingFailed(String),
}

fn format_reasons(reasons: &[IneligibilityReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_eligible_lists_every_reason() {
        let err = CirculationError::NotEligible(vec![
            IneligibilityReason::ReaderInactive,
            IneligibilityReason::LoanLimitReached,
        ]);
        assert_eq!(
            err.to_string(),
            "Reader is not eligible: reader account is inactive, open loan limit reached"
        );
    }
}
