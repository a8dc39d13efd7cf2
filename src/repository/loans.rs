//! Loans repository for database operations
//!
//! Loan creation locks the copy row and then the reader row; renewals and
//! returns lock the loan row. Each runs in a single transaction that is
//! rolled back when the engine's decision refuses the change.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    circulation::{
        error::CirculationError,
        store::{
            CheckoutContext, CheckoutDecision, CheckoutRequest, LoanContext, LoanDecision,
            LoanTransition,
        },
    },
    error::AppResult,
    models::{loan::LoanChange, Copy, CopyStatus, LibraryPolicy, Loan, LoanStatus, Reader},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    /// Get the open loan holding a copy, if any
    pub async fn get_open_by_copy(&self, copy_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE copy_id = $1 AND status = $2",
        )
        .bind(copy_id)
        .bind(LoanStatus::Open)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Count a reader's open loans
    pub async fn count_open_for_reader(&self, reader_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE reader_id = $1 AND status = $2",
        )
        .bind(reader_id)
        .bind(LoanStatus::Open)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Open loans of a reader
    pub async fn open_for_reader(&self, reader_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE reader_id = $1 AND status = $2 ORDER BY due_date, id",
        )
        .bind(reader_id)
        .bind(LoanStatus::Open)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// All open loans
    pub async fn open(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE status = $1 ORDER BY due_date, id",
        )
        .bind(LoanStatus::Open)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Create a loan atomically with the copy status change
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        decide: CheckoutDecision,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let copy = sqlx::query_as::<_, Copy>("SELECT * FROM copies WHERE id = $1 FOR UPDATE")
            .bind(request.copy_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CirculationError::CopyNotFound(request.copy_id))?;

        // Serializes concurrent checkouts by one reader against the loan ceiling
        let reader = sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE id = $1 FOR UPDATE")
            .bind(request.reader_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CirculationError::ReaderNotFound(request.reader_id))?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE reader_id = $1 AND status = $2",
        )
        .bind(reader.id)
        .bind(LoanStatus::Open)
        .fetch_one(&mut *tx)
        .await?;

        let policy = sqlx::query_as::<_, LibraryPolicy>(
            "SELECT * FROM library_policies WHERE library_id = $1",
        )
        .bind(request.library_id)
        .fetch_optional(&mut *tx)
        .await?;

        let new_loan = decide(&CheckoutContext {
            reader,
            copy,
            open_loans,
            policy,
        })?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (reader_id, copy_id, library_id, loan_date, due_date, status, renewal_count, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            RETURNING *
            "#,
        )
        .bind(new_loan.reader_id)
        .bind(new_loan.copy_id)
        .bind(new_loan.library_id)
        .bind(new_loan.loan_date)
        .bind(new_loan.due_date)
        .bind(LoanStatus::Open)
        .bind(new_loan.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE copies SET status = $1 WHERE id = $2")
            .bind(CopyStatus::Loaned)
            .bind(loan.copy_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Apply a renewal, return or reminder stamp under the loan's row lock
    pub async fn update(&self, loan_id: i32, decide: LoanDecision) -> AppResult<LoanTransition> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CirculationError::LoanNotFound(loan_id))?;

        let policy = sqlx::query_as::<_, LibraryPolicy>(
            "SELECT * FROM library_policies WHERE library_id = $1",
        )
        .bind(before.library_id)
        .fetch_optional(&mut *tx)
        .await?;

        let change = decide(&LoanContext {
            loan: before.clone(),
            policy,
        })?;

        let after = match change {
            LoanChange::Renewed {
                due_date,
                renewal_count,
            } => {
                sqlx::query_as::<_, Loan>(
                    "UPDATE loans SET due_date = $1, renewal_count = $2 WHERE id = $3 RETURNING *",
                )
                .bind(due_date)
                .bind(renewal_count)
                .bind(loan_id)
                .fetch_one(&mut *tx)
                .await?
            }
            LoanChange::Returned {
                returned_at,
                returned_by,
            } => {
                let after = sqlx::query_as::<_, Loan>(
                    r#"
                    UPDATE loans SET status = $1, returned_at = $2, returned_by = $3
                    WHERE id = $4
                    RETURNING *
                    "#,
                )
                .bind(LoanStatus::Returned)
                .bind(returned_at)
                .bind(returned_by)
                .bind(loan_id)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("UPDATE copies SET status = $1 WHERE id = $2")
                    .bind(CopyStatus::Available)
                    .bind(after.copy_id)
                    .execute(&mut *tx)
                    .await?;

                after
            }
            LoanChange::ReminderStamped { last_reminder_at } => {
                sqlx::query_as::<_, Loan>(
                    "UPDATE loans SET last_reminder_at = $1 WHERE id = $2 RETURNING *",
                )
                .bind(last_reminder_at)
                .bind(loan_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        Ok(LoanTransition { before, after })
    }

    /// Stamp the last reminder time
    pub async fn set_last_reminder(&self, loan_id: i32, at: DateTime<Utc>) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET last_reminder_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(at)
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CirculationError::LoanNotFound(loan_id))?;
        Ok(loan)
    }
}
