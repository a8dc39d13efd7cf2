//! Loan lifecycle controller
//!
//! Owns the open -> returned state machine. Every entry point takes the
//! acting staff id explicitly and refuses to run without a valid, active
//! staff member. Each committed action produces exactly one audit entry;
//! a failure to write it is reported but never undoes the action.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{
    audit::{AuditRecorder, AuditStatus},
    clock::Clock,
    eligibility::{self, Eligibility},
    error::CirculationError,
    overdue, renewal,
    store::{
        CheckoutDecision, CheckoutRequest, CirculationStore, LoanDecision, LoanTransition,
    },
    throttle::NotificationThrottle,
};
use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        loan::{CreateLoan, LoanChange, NewLoan},
        AuditAction, AuditEntry, Copy, CopyStatus, LibraryPolicy, Loan, Staff,
    },
};

/// Result of a loan creation or renewal
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanOutcome {
    pub loan: Loan,
    pub audit: AuditStatus,
}

/// Result of a return, with lateness derived at the moment of return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub was_overdue: bool,
    pub days_overdue: i64,
    pub audit: AuditStatus,
}

#[derive(Clone)]
pub struct CirculationEngine {
    store: Arc<dyn CirculationStore>,
    audit: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
    defaults: CirculationConfig,
    throttle: NotificationThrottle,
}

impl CirculationEngine {
    pub fn new(
        store: Arc<dyn CirculationStore>,
        audit: Arc<dyn AuditRecorder>,
        clock: Arc<dyn Clock>,
        defaults: CirculationConfig,
    ) -> Self {
        let throttle = NotificationThrottle::from_offset_minutes(defaults.reference_utc_offset_minutes);
        Self {
            store,
            audit,
            clock,
            defaults,
            throttle,
        }
    }

    pub fn store(&self) -> &Arc<dyn CirculationStore> {
        &self.store
    }

    pub fn throttle(&self) -> &NotificationThrottle {
        &self.throttle
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Effective policy of a library, falling back to the network defaults
    pub async fn policy_for(&self, library_id: i32) -> AppResult<LibraryPolicy> {
        let policy = self.store.library_policy(library_id).await?;
        Ok(policy.unwrap_or_else(|| LibraryPolicy::fallback(library_id, &self.defaults)))
    }

    /// Desk pre-check: may this reader start a loan under `library_id`'s policy
    /// (the reader's home library when none is given)?
    pub async fn check_eligibility(
        &self,
        reader_id: i32,
        library_id: Option<i32>,
    ) -> AppResult<Eligibility> {
        let reader = self
            .store
            .find_reader(reader_id)
            .await?
            .ok_or(CirculationError::ReaderNotFound(reader_id))?;
        let open_loans = self.store.count_open_loans(reader_id).await?;
        let policy = self.policy_for(library_id.unwrap_or(reader.library_id)).await?;

        Ok(eligibility::evaluate(&reader, open_loans, &policy, self.now()))
    }

    /// Lend a copy to a reader
    pub async fn create_loan(&self, request: &CreateLoan, staff_id: i32) -> AppResult<LoanOutcome> {
        let staff = self.acting_staff(staff_id).await?;
        let copy = self
            .store
            .find_copy(request.copy_id)
            .await?
            .ok_or(CirculationError::CopyNotFound(request.copy_id))?;

        let library_id = owning_library(&staff, &copy, request.library_id);
        let now = self.now();
        let defaults = self.defaults.clone();

        let decide: CheckoutDecision = Box::new(move |ctx| {
            if !ctx.copy.is_available() {
                return Err(CirculationError::CopyUnavailable(ctx.copy.id));
            }
            let policy = ctx
                .policy
                .clone()
                .unwrap_or_else(|| LibraryPolicy::fallback(library_id, &defaults));
            policy.ensure_valid()?;
            eligibility::evaluate(&ctx.reader, ctx.open_loans, &policy, now).into_result()?;

            Ok(NewLoan {
                reader_id: ctx.reader.id,
                copy_id: ctx.copy.id,
                library_id,
                loan_date: now,
                due_date: policy.due_date_from(now),
                created_by: staff_id,
            })
        });

        let loan = self
            .store
            .checkout(
                CheckoutRequest {
                    reader_id: request.reader_id,
                    copy_id: request.copy_id,
                    library_id,
                },
                decide,
            )
            .await?;

        tracing::info!(
            loan_id = loan.id,
            copy_id = loan.copy_id,
            reader_id = loan.reader_id,
            staff_id,
            "Loan created, due {}",
            loan.due_date
        );

        let audit = self
            .record_audit(AuditEntry {
                action: AuditAction::LoanCreated,
                loan_id: loan.id,
                subject: format!("copy {} to reader {}", loan.copy_id, loan.reader_id),
                payload: json!({
                    "reader_id": loan.reader_id,
                    "copy_id": loan.copy_id,
                    "loan_date": loan.loan_date,
                    "due_date": loan.due_date,
                    "inter_library": loan.library_id != copy.library_id,
                    "copy_status": {
                        "before": CopyStatus::Available,
                        "after": CopyStatus::Loaned,
                    },
                }),
                staff_id,
                library_id: loan.library_id,
                recorded_at: now,
            })
            .await;

        Ok(LoanOutcome { loan, audit })
    }

    /// Extend an open loan by the library's current loan period
    pub async fn renew_loan(&self, loan_id: i32, staff_id: i32) -> AppResult<LoanOutcome> {
        self.acting_staff(staff_id).await?;
        let now = self.now();
        let defaults = self.defaults.clone();

        let decide: LoanDecision = Box::new(move |ctx| {
            let policy = ctx
                .policy
                .clone()
                .unwrap_or_else(|| LibraryPolicy::fallback(ctx.loan.library_id, &defaults));
            let renewal = renewal::renew(&ctx.loan, &policy)?;
            Ok(LoanChange::Renewed {
                due_date: renewal.due_date,
                renewal_count: renewal.renewal_count,
            })
        });

        let LoanTransition { before, after } = self.store.update_loan(loan_id, decide).await?;

        tracing::info!(
            loan_id,
            staff_id,
            renewal_count = after.renewal_count,
            "Loan renewed, due {} (was {})",
            after.due_date,
            before.due_date
        );

        let audit = self
            .record_audit(AuditEntry {
                action: AuditAction::LoanRenewed,
                loan_id,
                subject: format!("copy {} to reader {}", after.copy_id, after.reader_id),
                payload: json!({
                    "due_date": { "before": before.due_date, "after": after.due_date },
                    "renewal_count": { "before": before.renewal_count, "after": after.renewal_count },
                    "overdue_at_renewal": overdue::is_overdue(&before, now),
                }),
                staff_id,
                library_id: after.library_id,
                recorded_at: now,
            })
            .await;

        Ok(LoanOutcome { loan: after, audit })
    }

    /// Close an open loan and put its copy back on the shelf
    pub async fn return_loan(&self, loan_id: i32, staff_id: i32) -> AppResult<ReturnOutcome> {
        self.acting_staff(staff_id).await?;
        let now = self.now();

        let decide: LoanDecision = Box::new(move |ctx| {
            if !ctx.loan.is_open() {
                return Err(CirculationError::LoanNotOpen(ctx.loan.id));
            }
            Ok(LoanChange::Returned {
                returned_at: now,
                returned_by: staff_id,
            })
        });

        let LoanTransition { before, after } = self.store.update_loan(loan_id, decide).await?;
        let was_overdue = overdue::is_overdue(&before, now);
        let days_overdue = overdue::days_overdue(&before, now);

        tracing::info!(
            loan_id,
            copy_id = after.copy_id,
            staff_id,
            days_overdue,
            "Loan returned"
        );

        let audit = self
            .record_audit(AuditEntry {
                action: AuditAction::LoanReturned,
                loan_id,
                subject: format!("copy {} from reader {}", after.copy_id, after.reader_id),
                payload: json!({
                    "due_date": before.due_date,
                    "returned_at": after.returned_at,
                    "overdue": was_overdue,
                    "days_overdue": days_overdue,
                    "status": { "before": before.status, "after": after.status },
                    "copy_status": {
                        "before": CopyStatus::Loaned,
                        "after": CopyStatus::Available,
                    },
                }),
                staff_id,
                library_id: after.library_id,
                recorded_at: now,
            })
            .await;

        Ok(ReturnOutcome {
            loan: after,
            was_overdue,
            days_overdue,
            audit,
        })
    }

    /// Renew whatever open loan holds `copy_id`
    pub async fn renew_copy(&self, copy_id: i32, staff_id: i32) -> AppResult<LoanOutcome> {
        let loan = self.open_loan_for_copy(copy_id).await?;
        self.renew_loan(loan.id, staff_id).await
    }

    /// Check in a copy at the desk
    pub async fn return_copy(&self, copy_id: i32, staff_id: i32) -> AppResult<ReturnOutcome> {
        let loan = self.open_loan_for_copy(copy_id).await?;
        self.return_loan(loan.id, staff_id).await
    }

    pub fn is_overdue(&self, loan: &Loan) -> bool {
        overdue::is_overdue(loan, self.now())
    }

    pub fn days_overdue(&self, loan: &Loan) -> i64 {
        overdue::days_overdue(loan, self.now())
    }

    /// Whether a reminder may be dispatched for the loan today
    pub async fn can_notify(&self, loan_id: i32) -> AppResult<bool> {
        let loan = self.find_loan(loan_id).await?;
        Ok(self.throttle.can_notify(&loan, self.now()))
    }

    /// Stamp the loan after a reminder went out
    pub async fn record_notification(&self, loan_id: i32) -> AppResult<Loan> {
        let now = self.now();
        let loan = self.store.set_last_reminder(loan_id, now).await?;
        tracing::debug!(loan_id, "Reminder recorded at {}", now);
        Ok(loan)
    }

    /// Take today's reminder slot of an open loan under its lock.
    ///
    /// Concurrent callers race for the slot; every loser gets
    /// `ReminderThrottled`, so at most one reminder goes out per loan and day.
    pub async fn claim_notification(&self, loan_id: i32) -> AppResult<LoanTransition> {
        let now = self.now();
        let throttle = self.throttle;

        let decide: LoanDecision = Box::new(move |ctx| {
            if !ctx.loan.is_open() {
                return Err(CirculationError::LoanNotOpen(ctx.loan.id));
            }
            if !throttle.can_notify(&ctx.loan, now) {
                return Err(CirculationError::ReminderThrottled(ctx.loan.id));
            }
            Ok(LoanChange::ReminderStamped {
                last_reminder_at: Some(now),
            })
        });

        let claim = self.store.update_loan(loan_id, decide).await?;
        tracing::debug!(loan_id, "Reminder slot claimed at {}", now);
        Ok(claim)
    }

    /// Hand back a claimed slot after the reminder could not be delivered
    pub async fn release_notification(&self, claim: &LoanTransition) -> AppResult<()> {
        let claimed = claim.after.last_reminder_at;
        let previous = claim.before.last_reminder_at;

        let decide: LoanDecision = Box::new(move |ctx| {
            // Leave a newer stamp alone
            let last_reminder_at = if ctx.loan.last_reminder_at == claimed {
                previous
            } else {
                ctx.loan.last_reminder_at
            };
            Ok(LoanChange::ReminderStamped { last_reminder_at })
        });

        self.store.update_loan(claim.after.id, decide).await?;
        tracing::debug!(loan_id = claim.after.id, "Reminder slot released");
        Ok(())
    }

    pub async fn find_loan(&self, loan_id: i32) -> AppResult<Loan> {
        Ok(self
            .store
            .find_loan(loan_id)
            .await?
            .ok_or(CirculationError::LoanNotFound(loan_id))?)
    }

    async fn open_loan_for_copy(&self, copy_id: i32) -> AppResult<Loan> {
        self.store
            .find_copy(copy_id)
            .await?
            .ok_or(CirculationError::CopyNotFound(copy_id))?;
        Ok(self
            .store
            .find_open_loan_for_copy(copy_id)
            .await?
            .ok_or(CirculationError::CopyNotOnLoan(copy_id))?)
    }

    async fn acting_staff(&self, staff_id: i32) -> AppResult<Staff> {
        match self.store.find_staff(staff_id).await? {
            Some(staff) if staff.active => Ok(staff),
            Some(_) => {
                tracing::warn!(staff_id, "Rejected circulation action by inactive staff");
                Err(CirculationError::ActorRequired.into())
            }
            None => {
                tracing::warn!(staff_id, "Rejected circulation action by unknown staff");
                Err(CirculationError::ActorRequired.into())
            }
        }
    }

    async fn record_audit(&self, entry: AuditEntry) -> AuditStatus {
        let action = entry.action;
        let loan_id = entry.loan_id;
        match self.audit.record(entry).await {
            Ok(()) => AuditStatus::Recorded,
            Err(e) => {
                let err = CirculationError::AuditRecordingFailed(e.to_string());
                tracing::error!(target: "audit_gap", %action, loan_id, "{}", err);
                AuditStatus::Failed {
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Library that authorizes a loan. A copy lent by staff from another library
/// is an inter-library loan owned by the override or the staff's library.
fn owning_library(staff: &Staff, copy: &Copy, library_override: Option<i32>) -> i32 {
    if staff.library_id != copy.library_id {
        library_override.unwrap_or(staff.library_id)
    } else {
        copy.library_id
    }
}
