//! In-memory circulation store and audit log
//!
//! One async mutex guards the whole state, so every checkout and loan
//! update is serialized and atomic. Suitable for embedding and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use crate::{
    circulation::{
        audit::AuditRecorder,
        error::CirculationError,
        store::{
            CheckoutContext, CheckoutDecision, CheckoutRequest, CirculationStore, LoanContext,
            LoanDecision, LoanTransition,
        },
    },
    error::AppResult,
    models::{
        loan::LoanChange, AuditEntry, Copy, CopyStatus, LibraryPolicy, Loan, LoanStatus, Reader,
        Staff,
    },
};

#[derive(Default)]
struct MemoryState {
    staff: HashMap<i32, Staff>,
    readers: HashMap<i32, Reader>,
    copies: HashMap<i32, Copy>,
    policies: HashMap<i32, LibraryPolicy>,
    loans: BTreeMap<i32, Loan>,
    next_loan_id: i32,
}

impl MemoryState {
    fn open_loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values().filter(|loan| loan.is_open())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_staff(&self, staff: Staff) {
        self.state.lock().await.staff.insert(staff.id, staff);
    }

    pub async fn insert_reader(&self, reader: Reader) {
        self.state.lock().await.readers.insert(reader.id, reader);
    }

    pub async fn insert_copy(&self, copy: Copy) {
        self.state.lock().await.copies.insert(copy.id, copy);
    }

    pub async fn set_policy(&self, policy: LibraryPolicy) {
        self.state.lock().await.policies.insert(policy.library_id, policy);
    }

    /// Import an existing loan; an open loan puts its copy on loan
    pub async fn insert_loan(&self, loan: Loan) {
        let mut state = self.state.lock().await;
        if loan.is_open() {
            if let Some(copy) = state.copies.get_mut(&loan.copy_id) {
                copy.status = CopyStatus::Loaned;
            }
        }
        state.next_loan_id = state.next_loan_id.max(loan.id);
        state.loans.insert(loan.id, loan);
    }
}

fn by_due_date(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by_key(|loan| (loan.due_date, loan.id));
    loans
}

#[async_trait]
impl CirculationStore for MemoryStore {
    async fn find_staff(&self, staff_id: i32) -> AppResult<Option<Staff>> {
        Ok(self.state.lock().await.staff.get(&staff_id).cloned())
    }

    async fn find_reader(&self, reader_id: i32) -> AppResult<Option<Reader>> {
        Ok(self.state.lock().await.readers.get(&reader_id).cloned())
    }

    async fn find_copy(&self, copy_id: i32) -> AppResult<Option<Copy>> {
        Ok(self.state.lock().await.copies.get(&copy_id).cloned())
    }

    async fn find_loan(&self, loan_id: i32) -> AppResult<Option<Loan>> {
        Ok(self.state.lock().await.loans.get(&loan_id).cloned())
    }

    async fn find_open_loan_for_copy(&self, copy_id: i32) -> AppResult<Option<Loan>> {
        let state = self.state.lock().await;
        let loan = state.open_loans().find(|loan| loan.copy_id == copy_id).cloned();
        Ok(loan)
    }

    async fn library_policy(&self, library_id: i32) -> AppResult<Option<LibraryPolicy>> {
        Ok(self.state.lock().await.policies.get(&library_id).cloned())
    }

    async fn count_open_loans(&self, reader_id: i32) -> AppResult<i64> {
        let state = self.state.lock().await;
        let count = state.open_loans().filter(|loan| loan.reader_id == reader_id).count();
        Ok(count as i64)
    }

    async fn reader_open_loans(&self, reader_id: i32) -> AppResult<Vec<Loan>> {
        let state = self.state.lock().await;
        let loans = state
            .open_loans()
            .filter(|loan| loan.reader_id == reader_id)
            .cloned()
            .collect();
        Ok(by_due_date(loans))
    }

    async fn open_loans(&self) -> AppResult<Vec<Loan>> {
        let state = self.state.lock().await;
        let loans = state.open_loans().cloned().collect();
        Ok(by_due_date(loans))
    }

    async fn checkout(&self, request: CheckoutRequest, decide: CheckoutDecision) -> AppResult<Loan> {
        let mut state = self.state.lock().await;

        let copy = state
            .copies
            .get(&request.copy_id)
            .cloned()
            .ok_or(CirculationError::CopyNotFound(request.copy_id))?;
        let reader = state
            .readers
            .get(&request.reader_id)
            .cloned()
            .ok_or(CirculationError::ReaderNotFound(request.reader_id))?;
        let open_loans = state
            .open_loans()
            .filter(|loan| loan.reader_id == reader.id)
            .count() as i64;
        let policy = state.policies.get(&request.library_id).cloned();

        let new_loan = decide(&CheckoutContext {
            reader,
            copy,
            open_loans,
            policy,
        })?;

        state.next_loan_id += 1;
        let loan = Loan {
            id: state.next_loan_id,
            reader_id: new_loan.reader_id,
            copy_id: new_loan.copy_id,
            library_id: new_loan.library_id,
            loan_date: new_loan.loan_date,
            due_date: new_loan.due_date,
            returned_at: None,
            status: LoanStatus::Open,
            renewal_count: 0,
            last_reminder_at: None,
            created_by: new_loan.created_by,
            returned_by: None,
        };
        if let Some(copy) = state.copies.get_mut(&loan.copy_id) {
            copy.status = CopyStatus::Loaned;
        }
        state.loans.insert(loan.id, loan.clone());

        Ok(loan)
    }

    async fn update_loan(&self, loan_id: i32, decide: LoanDecision) -> AppResult<LoanTransition> {
        let mut state = self.state.lock().await;

        let before = state
            .loans
            .get(&loan_id)
            .cloned()
            .ok_or(CirculationError::LoanNotFound(loan_id))?;
        let policy = state.policies.get(&before.library_id).cloned();

        let change = decide(&LoanContext {
            loan: before.clone(),
            policy,
        })?;

        let mut after = before.clone();
        match change {
            LoanChange::Renewed {
                due_date,
                renewal_count,
            } => {
                after.due_date = due_date;
                after.renewal_count = renewal_count;
            }
            LoanChange::Returned {
                returned_at,
                returned_by,
            } => {
                after.status = LoanStatus::Returned;
                after.returned_at = Some(returned_at);
                after.returned_by = Some(returned_by);
                if let Some(copy) = state.copies.get_mut(&after.copy_id) {
                    copy.status = CopyStatus::Available;
                }
            }
            LoanChange::ReminderStamped { last_reminder_at } => {
                after.last_reminder_at = last_reminder_at;
            }
        }
        state.loans.insert(loan_id, after.clone());

        Ok(LoanTransition { before, after })
    }

    async fn set_last_reminder(&self, loan_id: i32, at: DateTime<Utc>) -> AppResult<Loan> {
        let mut state = self.state.lock().await;
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(CirculationError::LoanNotFound(loan_id))?;
        loan.last_reminder_at = Some(at);
        Ok(loan.clone())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Audit entries kept in process memory
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditRecorder for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> AppResult<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
