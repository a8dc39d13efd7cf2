//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::LoanStatus;

/// Canonical loan record. Closed loans are kept as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub reader_id: i32,
    pub copy_id: i32,
    /// Library that authorized the loan, not necessarily the copy's library
    pub library_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub renewal_count: i16,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub created_by: i32,
    pub returned_by: Option<i32>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.status == LoanStatus::Open
    }
}

/// Fields of a loan about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub reader_id: i32,
    pub copy_id: i32,
    pub library_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub created_by: i32,
}

/// Change applied to an open loan inside one atomic unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanChange {
    Renewed {
        due_date: DateTime<Utc>,
        renewal_count: i16,
    },
    /// The store also puts the copy back on the shelf
    Returned {
        returned_at: DateTime<Utc>,
        returned_by: i32,
    },
    ReminderStamped {
        last_reminder_at: Option<DateTime<Utc>>,
    },
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(range(min = 1, message = "reader_id must be positive"))]
    pub reader_id: i32,
    #[validate(range(min = 1, message = "copy_id must be positive"))]
    pub copy_id: i32,
    /// Authorizing library for an inter-library loan
    pub library_id: Option<i32>,
}

/// Loan with display fields, built outside the engine
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub reader_name: Option<String>,
    pub copy_title: Option<String>,
    pub copy_barcode: Option<String>,
    pub is_overdue: bool,
    pub days_overdue: i64,
    pub can_notify: bool,
}
