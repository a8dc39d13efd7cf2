//! Storage seam of the circulation engine
//!
//! Each mutating call is one atomic unit over a loan and its copy. The store
//! locks the rows involved, hands a snapshot to the engine's decision, and
//! commits only what the decision returns. A decision error leaves every row
//! as it was.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::CirculationError;
use crate::{
    error::AppResult,
    models::{
        loan::{LoanChange, NewLoan},
        Copy, LibraryPolicy, Loan, Reader, Staff,
    },
};

/// Locked state handed to a loan-creation decision
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub reader: Reader,
    pub copy: Copy,
    /// Reader's open loans across all libraries
    pub open_loans: i64,
    /// Policy of the authorizing library, if it has one
    pub policy: Option<LibraryPolicy>,
}

/// Locked state handed to a renewal or return decision
#[derive(Debug, Clone)]
pub struct LoanContext {
    pub loan: Loan,
    /// Policy of the loan's library as of now
    pub policy: Option<LibraryPolicy>,
}

/// What to lock for a loan creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub reader_id: i32,
    pub copy_id: i32,
    /// Authorizing library whose policy applies
    pub library_id: i32,
}

pub type CheckoutDecision =
    Box<dyn FnOnce(&CheckoutContext) -> Result<NewLoan, CirculationError> + Send>;

pub type LoanDecision =
    Box<dyn FnOnce(&LoanContext) -> Result<LoanChange, CirculationError> + Send>;

/// A committed change to an existing loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTransition {
    pub before: Loan,
    pub after: Loan,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CirculationStore: Send + Sync {
    async fn find_staff(&self, staff_id: i32) -> AppResult<Option<Staff>>;

    async fn find_reader(&self, reader_id: i32) -> AppResult<Option<Reader>>;

    async fn find_copy(&self, copy_id: i32) -> AppResult<Option<Copy>>;

    async fn find_loan(&self, loan_id: i32) -> AppResult<Option<Loan>>;

    async fn find_open_loan_for_copy(&self, copy_id: i32) -> AppResult<Option<Loan>>;

    async fn library_policy(&self, library_id: i32) -> AppResult<Option<LibraryPolicy>>;

    async fn count_open_loans(&self, reader_id: i32) -> AppResult<i64>;

    /// Open loans of one reader, oldest due date first
    async fn reader_open_loans(&self, reader_id: i32) -> AppResult<Vec<Loan>>;

    /// Every open loan, oldest due date first
    async fn open_loans(&self) -> AppResult<Vec<Loan>>;

    /// Lock copy and reader, run `decide`, insert the loan and mark the copy loaned
    async fn checkout(&self, request: CheckoutRequest, decide: CheckoutDecision) -> AppResult<Loan>;

    /// Lock the loan, run `decide`, apply the change (and copy release on return)
    async fn update_loan(&self, loan_id: i32, decide: LoanDecision) -> AppResult<LoanTransition>;

    async fn set_last_reminder(&self, loan_id: i32, at: DateTime<Utc>) -> AppResult<Loan>;

    /// Readiness check
    async fn ping(&self) -> AppResult<()>;
}
