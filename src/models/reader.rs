//! Reader (borrower) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A person allowed to borrow. Read-only to the circulation engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reader {
    pub id: i32,
    pub active: bool,
    /// Borrowing is suspended while this instant lies in the future
    pub blocked_until: Option<DateTime<Utc>>,
    /// Home library, used for quota defaults
    pub library_id: i32,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Reader {
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.map(|until| until > now).unwrap_or(false)
    }
}
