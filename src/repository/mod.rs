//! Repository layer for database operations

pub mod audit;
pub mod copies;
pub mod loans;
pub mod memory;
pub mod policies;
pub mod readers;
pub mod staff;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    circulation::store::{
        CheckoutDecision, CheckoutRequest, CirculationStore, LoanDecision, LoanTransition,
    },
    error::AppResult,
    models::{Copy, LibraryPolicy, Loan, Reader, Staff},
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub readers: readers::ReadersRepository,
    pub copies: copies::CopiesRepository,
    pub loans: loans::LoansRepository,
    pub staff: staff::StaffRepository,
    pub policies: policies::PoliciesRepository,
    pub audit: audit::AuditRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            readers: readers::ReadersRepository::new(pool.clone()),
            copies: copies::CopiesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            staff: staff::StaffRepository::new(pool.clone()),
            policies: policies::PoliciesRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            pool,
        }
    }

    /// Cheap connectivity check for readiness
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CirculationStore for Repository {
    async fn find_staff(&self, staff_id: i32) -> AppResult<Option<Staff>> {
        self.staff.get_by_id(staff_id).await
    }

    async fn find_reader(&self, reader_id: i32) -> AppResult<Option<Reader>> {
        self.readers.get_by_id(reader_id).await
    }

    async fn find_copy(&self, copy_id: i32) -> AppResult<Option<Copy>> {
        self.copies.get_by_id(copy_id).await
    }

    async fn find_loan(&self, loan_id: i32) -> AppResult<Option<Loan>> {
        self.loans.get_by_id(loan_id).await
    }

    async fn find_open_loan_for_copy(&self, copy_id: i32) -> AppResult<Option<Loan>> {
        self.loans.get_open_by_copy(copy_id).await
    }

    async fn library_policy(&self, library_id: i32) -> AppResult<Option<LibraryPolicy>> {
        self.policies.get_for_library(library_id).await
    }

    async fn count_open_loans(&self, reader_id: i32) -> AppResult<i64> {
        self.loans.count_open_for_reader(reader_id).await
    }

    async fn reader_open_loans(&self, reader_id: i32) -> AppResult<Vec<Loan>> {
        self.loans.open_for_reader(reader_id).await
    }

    async fn open_loans(&self) -> AppResult<Vec<Loan>> {
        self.loans.open().await
    }

    async fn checkout(&self, request: CheckoutRequest, decide: CheckoutDecision) -> AppResult<Loan> {
        self.loans.checkout(request, decide).await
    }

    async fn update_loan(&self, loan_id: i32, decide: LoanDecision) -> AppResult<LoanTransition> {
        self.loans.update(loan_id, decide).await
    }

    async fn set_last_reminder(&self, loan_id: i32, at: DateTime<Utc>) -> AppResult<Loan> {
        self.loans.set_last_reminder(loan_id, at).await
    }

    async fn ping(&self) -> AppResult<()> {
        Repository::ping(self).await
    }
}
