//! Circulation engine: loan eligibility, lifecycle, renewals, overdue
//! classification and reminder throttling.
//!
//! The pure pieces (`eligibility`, `overdue`, `renewal`, `throttle`) hold no
//! state and may be called from anywhere. `lifecycle` drives them against a
//! [`store::CirculationStore`], which provides the per-copy and per-loan
//! atomicity.

pub mod audit;
pub mod clock;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod overdue;
pub mod renewal;
pub mod store;
pub mod throttle;

pub use audit::{AuditRecorder, AuditStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use eligibility::{evaluate, Eligibility};
pub use error::{CirculationError, IneligibilityReason};
pub use lifecycle::{CirculationEngine, LoanOutcome, ReturnOutcome};
pub use overdue::{days_overdue, is_overdue};
pub use renewal::{renew, Renewal, MAX_RENEWALS};
pub use store::{CheckoutContext, CirculationStore, LoanContext};
pub use throttle::NotificationThrottle;
