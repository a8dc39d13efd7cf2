//! Reminder throttling
//!
//! At most one reminder per loan per calendar day of the reference time
//! zone. The day boundary matters, not a rolling 24 hour window: a reminder
//! sent at 23:59 does not block one at 00:01 the next day.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::models::Loan;

#[derive(Debug, Clone, Copy)]
pub struct NotificationThrottle {
    zone: FixedOffset,
}

impl NotificationThrottle {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    /// Build from a UTC offset in minutes; out-of-range offsets fall back to UTC
    pub fn from_offset_minutes(minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(zone) => Self::new(zone),
            None => {
                tracing::warn!("Invalid reference UTC offset of {} minutes, using UTC", minutes);
                Self::default()
            }
        }
    }

    /// Calendar date of `at` in the reference time zone
    pub fn calendar_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.zone).date_naive()
    }

    pub fn can_notify(&self, loan: &Loan, now: DateTime<Utc>) -> bool {
        match loan.last_reminder_at {
            None => true,
            Some(sent) => self.calendar_date(sent) != self.calendar_date(now),
        }
    }
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;
    use chrono::{Duration, TimeZone};

    fn loan(last_reminder_at: Option<DateTime<Utc>>) -> Loan {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        Loan {
            id: 1,
            reader_id: 1,
            copy_id: 1,
            library_id: 1,
            loan_date: due - Duration::days(14),
            due_date: due,
            returned_at: None,
            status: LoanStatus::Open,
            renewal_count: 0,
            last_reminder_at,
            created_by: 1,
            returned_by: None,
        }
    }

    #[test]
    fn test_never_notified_is_allowed() {
        let throttle = NotificationThrottle::default();
        assert!(throttle.can_notify(&loan(None), Utc::now()));
    }

    #[test]
    fn test_same_day_is_refused() {
        let throttle = NotificationThrottle::default();
        let sent = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap();
        assert!(!throttle.can_notify(&loan(Some(sent)), sent));
        assert!(!throttle.can_notify(&loan(Some(sent)), later));
    }

    #[test]
    fn test_midnight_rollover_is_allowed() {
        let throttle = NotificationThrottle::default();
        let sent = Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 1, 16, 0, 1, 0).unwrap();
        assert!(throttle.can_notify(&loan(Some(sent)), next));
    }

    #[test]
    fn test_day_boundary_follows_reference_zone() {
        // UTC+02:00: 21:30Z and 22:30Z fall on different local days
        let throttle = NotificationThrottle::from_offset_minutes(120);
        let sent = Utc.with_ymd_and_hms(2024, 1, 15, 21, 30, 0).unwrap();
        let after_local_midnight = Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap();
        assert!(throttle.can_notify(&loan(Some(sent)), after_local_midnight));

        let utc = NotificationThrottle::default();
        assert!(!utc.can_notify(&loan(Some(sent)), after_local_midnight));
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let throttle = NotificationThrottle::from_offset_minutes(100_000);
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap();
        assert_eq!(throttle.calendar_date(at), at.date_naive());
    }
}
