//! Overdue reminder batch
//!
//! Walks the open loans and picks the overdue ones the throttle still allows
//! today. Each loan's daily slot is claimed under the loan lock before the
//! reminder goes to a [`ReminderSender`], so overlapping batches never send
//! twice; a failed delivery hands the slot back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::{
    circulation::{overdue, CirculationEngine, CirculationError},
    error::AppResult,
    models::Loan,
};

/// What happened to one loan in a batch
enum Dispatch {
    Sent,
    Throttled,
    Skipped,
}

/// Everything a transport needs to compose one reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueReminder {
    pub loan_id: i32,
    pub email: String,
    pub reader_name: Option<String>,
    pub copy_title: Option<String>,
    pub due_date: DateTime<Utc>,
    pub days_overdue: i64,
}

/// Delivers reminders to readers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send_overdue_reminder(&self, reminder: OverdueReminder) -> AppResult<()>;
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReminderReport {
    /// Overdue open loans examined
    pub considered: u32,
    pub sent: u32,
    /// Already reminded today
    pub throttled: u32,
    /// Reader has no email address
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Clone)]
pub struct RemindersService {
    engine: CirculationEngine,
    sender: Arc<dyn ReminderSender>,
}

impl RemindersService {
    pub fn new(engine: CirculationEngine, sender: Arc<dyn ReminderSender>) -> Self {
        Self { engine, sender }
    }

    /// Send today's reminders for every overdue loan
    pub async fn run_batch(&self) -> AppResult<ReminderReport> {
        let now = self.engine.now();
        let mut report = ReminderReport::default();

        let overdue_loans = self
            .engine
            .store()
            .open_loans()
            .await?
            .into_iter()
            .filter(|loan| overdue::is_overdue(loan, now));

        for loan in overdue_loans {
            report.considered += 1;
            let outcome = self.remind(&loan, now).await;
            match outcome {
                Ok(Dispatch::Sent) => report.sent += 1,
                Ok(Dispatch::Throttled) => report.throttled += 1,
                Ok(Dispatch::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(loan_id = loan.id, "Reminder failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            considered = report.considered,
            sent = report.sent,
            throttled = report.throttled,
            skipped = report.skipped,
            failed = report.failed,
            "Reminder batch finished"
        );

        Ok(report)
    }

    async fn remind(&self, loan: &Loan, now: DateTime<Utc>) -> AppResult<Dispatch> {
        let store = self.engine.store();

        if !self.engine.throttle().can_notify(loan, now) {
            return Ok(Dispatch::Throttled);
        }

        let Some(reader) = store.find_reader(loan.reader_id).await? else {
            tracing::warn!(
                loan_id = loan.id,
                reader_id = loan.reader_id,
                "Reminder skipped, reader missing"
            );
            return Ok(Dispatch::Skipped);
        };
        let Some(email) = reader.email.clone() else {
            tracing::debug!(loan_id = loan.id, "Reminder skipped, reader has no email");
            return Ok(Dispatch::Skipped);
        };
        let copy = store.find_copy(loan.copy_id).await?;

        // Another batch may have reminded this loan since the listing
        let claim = match self.engine.claim_notification(loan.id).await {
            Ok(claim) => claim,
            Err(e) => {
                return match e.circulation() {
                    Some(CirculationError::ReminderThrottled(_)) => Ok(Dispatch::Throttled),
                    Some(CirculationError::LoanNotOpen(_)) => Ok(Dispatch::Skipped),
                    _ => Err(e),
                };
            }
        };

        let reminder = OverdueReminder {
            loan_id: loan.id,
            email,
            reader_name: reader.display_name.clone(),
            copy_title: copy.and_then(|c| c.title),
            due_date: loan.due_date,
            days_overdue: overdue::days_overdue(loan, now),
        };

        if let Err(e) = self.sender.send_overdue_reminder(reminder).await {
            if let Err(release) = self.engine.release_notification(&claim).await {
                tracing::error!(loan_id = loan.id, "Could not release reminder slot: {}", release);
            }
            return Err(e);
        }

        Ok(Dispatch::Sent)
    }

    /// Run the batch on a fixed interval until the runtime shuts down
    pub fn spawn_periodic(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_batch().await {
                    tracing::error!("Reminder batch failed: {}", e);
                }
            }
        })
    }
}
