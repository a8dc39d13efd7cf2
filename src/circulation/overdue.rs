//! Overdue classification
//!
//! Overdue status is always derived from the due date and "now"; nothing
//! about it is persisted.

use chrono::{DateTime, Duration, Utc};

use crate::models::Loan;

/// An open loan whose due date lies strictly before `now`
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    loan.is_open() && loan.due_date < now
}

/// Whole days late, rounded up; zero when the loan is not overdue
pub fn days_overdue(loan: &Loan, now: DateTime<Utc>) -> i64 {
    if !is_overdue(loan, now) {
        return 0;
    }
    let late = now - loan.due_date;
    let whole_days = late.num_days();
    if late > Duration::days(whole_days) {
        whole_days + 1
    } else {
        whole_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;
    use chrono::TimeZone;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn loan(status: LoanStatus) -> Loan {
        Loan {
            id: 1,
            reader_id: 1,
            copy_id: 1,
            library_id: 1,
            loan_date: due() - Duration::days(14),
            due_date: due(),
            returned_at: None,
            status,
            renewal_count: 0,
            last_reminder_at: None,
            created_by: 1,
            returned_by: None,
        }
    }

    #[test]
    fn test_not_overdue_at_due_instant() {
        let loan = loan(LoanStatus::Open);
        assert!(!is_overdue(&loan, due()));
        assert_eq!(days_overdue(&loan, due()), 0);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let loan = loan(LoanStatus::Open);
        let now = due() + Duration::seconds(1);
        assert!(is_overdue(&loan, now));
        assert_eq!(days_overdue(&loan, now), 1);
    }

    #[test]
    fn test_sub_millisecond_lateness_counts_as_a_day() {
        let loan = loan(LoanStatus::Open);
        let now = due() + Duration::microseconds(500);
        assert!(is_overdue(&loan, now));
        assert_eq!(days_overdue(&loan, now), 1);
        assert_eq!(days_overdue(&loan, due() + Duration::nanoseconds(1)), 1);
    }

    #[test]
    fn test_exact_days_are_not_rounded() {
        let loan = loan(LoanStatus::Open);
        assert_eq!(days_overdue(&loan, due() + Duration::days(5)), 5);
        assert_eq!(days_overdue(&loan, due() + Duration::days(5) + Duration::minutes(1)), 6);
    }

    #[test]
    fn test_before_due_is_zero() {
        let loan = loan(LoanStatus::Open);
        assert_eq!(days_overdue(&loan, due() - Duration::days(3)), 0);
    }

    #[test]
    fn test_returned_loan_is_never_overdue() {
        let loan = loan(LoanStatus::Returned);
        let now = due() + Duration::days(40);
        assert!(!is_overdue(&loan, now));
        assert_eq!(days_overdue(&loan, now), 0);
    }
}
