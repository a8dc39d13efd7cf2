//! Loan read-side projections for the desk and dashboards

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    circulation::{overdue, CirculationEngine, CirculationError},
    error::AppResult,
    models::{Loan, LoanDetails, Reader},
};

/// Dashboard loan counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoanStats {
    pub open: i64,
    pub overdue: i64,
}

#[derive(Clone)]
pub struct LoansService {
    engine: CirculationEngine,
}

impl LoansService {
    pub fn new(engine: CirculationEngine) -> Self {
        Self { engine }
    }

    /// Get one loan with display fields
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.engine.find_loan(loan_id).await?;
        let reader = self.engine.store().find_reader(loan.reader_id).await?;
        self.details(loan, reader.as_ref()).await
    }

    /// Get open loans for a reader
    pub async fn get_reader_loans(&self, reader_id: i32) -> AppResult<Vec<LoanDetails>> {
        let store = self.engine.store();
        let reader = store
            .find_reader(reader_id)
            .await?
            .ok_or(CirculationError::ReaderNotFound(reader_id))?;

        let mut result = Vec::new();
        for loan in store.reader_open_loans(reader_id).await? {
            result.push(self.details(loan, Some(&reader)).await?);
        }
        Ok(result)
    }

    /// Count open and overdue loans
    pub async fn loan_stats(&self) -> AppResult<LoanStats> {
        let now = self.engine.now();
        let loans = self.engine.store().open_loans().await?;
        let overdue = loans.iter().filter(|loan| overdue::is_overdue(loan, now)).count();
        Ok(LoanStats {
            open: loans.len() as i64,
            overdue: overdue as i64,
        })
    }

    async fn details(&self, loan: Loan, reader: Option<&Reader>) -> AppResult<LoanDetails> {
        let now = self.engine.now();
        let copy = self.engine.store().find_copy(loan.copy_id).await?;
        let (copy_title, copy_barcode) = copy.map(|c| (c.title, c.barcode)).unwrap_or_default();

        Ok(LoanDetails {
            reader_name: reader.and_then(|r| r.display_name.clone()),
            copy_title,
            copy_barcode,
            is_overdue: overdue::is_overdue(&loan, now),
            days_overdue: overdue::days_overdue(&loan, now),
            can_notify: self.engine.throttle().can_notify(&loan, now),
            loan,
        })
    }
}
