//! Audit log repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{circulation::audit::AuditRecorder, error::AppResult, models::AuditEntry};

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRecorder for AuditRepository {
    async fn record(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (action, loan_id, subject, payload, staff_id, library_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.action.as_str())
        .bind(entry.loan_id)
        .bind(&entry.subject)
        .bind(&entry.payload)
        .bind(entry.staff_id)
        .bind(entry.library_id)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
