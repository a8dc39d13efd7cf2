//! API handlers for circulation REST endpoints

pub mod health;
pub mod loans;
pub mod openapi;
pub mod readers;
pub mod reminders;
pub mod stats;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::StaffClaims, AppState};

/// Extractor for the acting staff member from a JWT token
pub struct AuthenticatedStaff(pub StaffClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedStaff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = StaffClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedStaff(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Loans
        .route("/loans", post(loans::create_loan))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/renew", post(loans::renew_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .route(
            "/loans/:id/notification",
            get(loans::get_notification).post(loans::record_notification),
        )
        // Desk shortcuts by copy
        .route("/copies/:id/renew", post(loans::renew_copy))
        .route("/copies/:id/return", post(loans::return_copy))
        // Readers
        .route("/readers/:id/loans", get(readers::get_reader_loans))
        .route("/readers/:id/eligibility", get(readers::get_eligibility))
        // Reminders
        .route("/reminders/run", post(reminders::run_reminders))
        // Statistics
        .route("/stats/loans", get(stats::get_loan_stats))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
