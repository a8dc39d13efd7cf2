//! Copy (physical circulating item) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::CopyStatus;

/// One physical instance of a catalogued work
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Copy {
    pub id: i32,
    /// Library holding the copy
    pub library_id: i32,
    pub status: CopyStatus,
    pub barcode: Option<String>,
    pub title: Option<String>,
}

impl Copy {
    pub fn is_available(&self) -> bool {
        self.status == CopyStatus::Available
    }
}
