//! Staff repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Staff};

#[derive(Clone)]
pub struct StaffRepository {
    pool: Pool<Postgres>,
}

impl StaffRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get staff member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(staff)
    }
}
