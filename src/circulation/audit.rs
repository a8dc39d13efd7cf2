//! Audit trail contract

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::AuditEntry};

/// Persists one entry per committed circulation action
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> AppResult<()>;
}

/// Whether the audit entry of an operation was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Recorded,
    /// The business change stands; the audit trail has a gap
    Failed { message: String },
}

impl AuditStatus {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditStatus::Recorded)
    }
}
