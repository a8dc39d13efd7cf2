//! Readers repository (read-only for circulation)

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Reader};

#[derive(Clone)]
pub struct ReadersRepository {
    pool: Pool<Postgres>,
}

impl ReadersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reader by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reader)
    }
}
