//! Business logic services

pub mod email;
pub mod loans;
pub mod reminders;

use std::sync::Arc;

use crate::{circulation::CirculationEngine, config::EmailConfig};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub circulation: CirculationEngine,
    pub loans: loans::LoansService,
    pub reminders: reminders::RemindersService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services around one circulation engine
    pub fn new(engine: CirculationEngine, email_config: EmailConfig) -> Self {
        let email = email::EmailService::new(email_config);
        Self::with_reminder_sender(engine, email, None)
    }

    /// Same as [`Services::new`] with a custom reminder transport
    pub fn with_reminder_sender(
        engine: CirculationEngine,
        email: email::EmailService,
        sender: Option<Arc<dyn reminders::ReminderSender>>,
    ) -> Self {
        let sender = sender.unwrap_or_else(|| Arc::new(email.clone()));
        Self {
            loans: loans::LoansService::new(engine.clone()),
            reminders: reminders::RemindersService::new(engine.clone(), sender),
            circulation: engine,
            email,
        }
    }
}
