//! Per-library loan policy

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::{circulation::CirculationError, config::CirculationConfig};

/// Loan rules configured by a library's administration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LibraryPolicy {
    pub library_id: i32,
    pub loan_period_days: i32,
    pub max_open_loans: i32,
}

impl LibraryPolicy {
    /// Network-wide fallback for a library without its own policy row
    pub fn fallback(library_id: i32, defaults: &CirculationConfig) -> Self {
        Self {
            library_id,
            loan_period_days: defaults.default_loan_period_days,
            max_open_loans: defaults.default_max_open_loans,
        }
    }

    pub fn loan_period(&self) -> Duration {
        Duration::days(i64::from(self.loan_period_days))
    }

    /// Due date for a loan starting at `start`
    pub fn due_date_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.loan_period()
    }

    /// A usable policy lends for at least one day and allows no negative quota
    pub fn ensure_valid(&self) -> Result<(), CirculationError> {
        if self.loan_period_days < 1 || self.max_open_loans < 0 {
            tracing::error!(
                library_id = self.library_id,
                loan_period_days = self.loan_period_days,
                max_open_loans = self.max_open_loans,
                "Refusing invalid loan policy"
            );
            return Err(CirculationError::InvalidPolicy(self.library_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(loan_period_days: i32, max_open_loans: i32) -> LibraryPolicy {
        LibraryPolicy {
            library_id: 4,
            loan_period_days,
            max_open_loans,
        }
    }

    #[test]
    fn test_valid_policy() {
        assert_eq!(policy(14, 3).ensure_valid(), Ok(()));
        assert_eq!(policy(1, 0).ensure_valid(), Ok(()));
    }

    #[test]
    fn test_non_positive_period_is_refused() {
        assert_eq!(policy(0, 3).ensure_valid(), Err(CirculationError::InvalidPolicy(4)));
        assert_eq!(policy(-3, 3).ensure_valid(), Err(CirculationError::InvalidPolicy(4)));
    }

    #[test]
    fn test_negative_quota_is_refused() {
        assert_eq!(policy(14, -1).ensure_valid(), Err(CirculationError::InvalidPolicy(4)));
    }
}
