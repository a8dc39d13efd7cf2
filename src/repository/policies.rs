//! Library loan policies (administered elsewhere, read here)

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::LibraryPolicy};

#[derive(Clone)]
pub struct PoliciesRepository {
    pool: Pool<Postgres>,
}

impl PoliciesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_for_library(&self, library_id: i32) -> AppResult<Option<LibraryPolicy>> {
        let policy = sqlx::query_as::<_, LibraryPolicy>(
            "SELECT * FROM library_policies WHERE library_id = $1",
        )
        .bind(library_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(policy)
    }
}
