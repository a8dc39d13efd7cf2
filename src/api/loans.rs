//! Loan lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    circulation::{LoanOutcome, ReturnOutcome},
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, LoanDetails},
        Loan,
    },
    AppState,
};

use super::AuthenticatedStaff;

/// Reminder throttle state of a loan
#[derive(Serialize, ToSchema)]
pub struct NotificationStatus {
    pub loan_id: i32,
    /// Whether a reminder may still be sent today
    pub can_notify: bool,
}

/// Lend a copy to a reader
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanOutcome),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Reader or copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not available", body = crate::error::ErrorResponse),
        (status = 422, description = "Reader not eligible", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanOutcome>)> {
    claims.require_circulation()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = state
        .services
        .circulation
        .create_loan(&request, claims.staff_id)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Get one loan with derived lateness
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_circulation()?;

    let loan = state.services.loans.get_loan(loan_id).await?;
    Ok(Json(loan))
}

/// Extend a loan by one loan period
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = LoanOutcome),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan closed or renewal limit reached", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_loan(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanOutcome>> {
    claims.require_circulation()?;

    let outcome = state
        .services
        .circulation
        .renew_loan(loan_id, claims.staff_id)
        .await?;
    Ok(Json(outcome))
}

/// Close a loan and release its copy
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan returned", body = ReturnOutcome),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnOutcome>> {
    claims.require_circulation()?;

    let outcome = state
        .services
        .circulation
        .return_loan(loan_id, claims.staff_id)
        .await?;
    Ok(Json(outcome))
}

/// Renew the open loan of a copy
#[utoipa::path(
    post,
    path = "/copies/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = LoanOutcome),
        (status = 404, description = "Copy not found or not on loan", body = crate::error::ErrorResponse),
        (status = 409, description = "Renewal limit reached", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_copy(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(copy_id): Path<i32>,
) -> AppResult<Json<LoanOutcome>> {
    claims.require_circulation()?;

    let outcome = state
        .services
        .circulation
        .renew_copy(copy_id, claims.staff_id)
        .await?;
    Ok(Json(outcome))
}

/// Check in a copy
#[utoipa::path(
    post,
    path = "/copies/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Loan returned", body = ReturnOutcome),
        (status = 404, description = "Copy not found or not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_copy(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(copy_id): Path<i32>,
) -> AppResult<Json<ReturnOutcome>> {
    claims.require_circulation()?;

    let outcome = state
        .services
        .circulation
        .return_copy(copy_id, claims.staff_id)
        .await?;
    Ok(Json(outcome))
}

/// Whether a reminder may be sent today
#[utoipa::path(
    get,
    path = "/loans/{id}/notification",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Throttle state", body = NotificationStatus),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_notification(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<NotificationStatus>> {
    claims.require_circulation()?;

    let can_notify = state.services.circulation.can_notify(loan_id).await?;
    Ok(Json(NotificationStatus { loan_id, can_notify }))
}

/// Record that a reminder was sent by hand
#[utoipa::path(
    post,
    path = "/loans/{id}/notification",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Reminder recorded", body = Loan),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_notification(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    claims.require_circulation()?;

    let loan = state.services.circulation.record_notification(loan_id).await?;
    Ok(Json(loan))
}
