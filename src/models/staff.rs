//! Staff (acting librarian) model and authentication claims

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// A librarian or administrator acting at a circulation desk
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: i32,
    pub library_id: i32,
    pub active: bool,
    pub display_name: Option<String>,
}

/// JWT claims for authenticated staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String,
    pub staff_id: i32,
    pub library_id: i32,
    /// Whether the holder may run circulation actions
    pub circulation: bool,
    pub exp: i64,
    pub iat: i64,
}

impl StaffClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_circulation(&self) -> Result<(), AppError> {
        if self.circulation {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to run circulation actions".to_string(),
            ))
        }
    }
}
