//! Audit trail entries for circulation actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::AuditAction;

/// One state-changing circulation action with before/after data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub loan_id: i32,
    /// Human readable subject, e.g. "copy 12 to reader 4"
    pub subject: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub staff_id: i32,
    pub library_id: i32,
    pub recorded_at: DateTime<Utc>,
}
