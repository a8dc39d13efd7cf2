//! Reader circulation endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    circulation::Eligibility,
    error::AppResult,
    models::loan::LoanDetails,
    AppState,
};

use super::AuthenticatedStaff;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibilityQuery {
    /// Library whose policy applies (reader's home library when omitted)
    pub library_id: Option<i32>,
}

/// Get open loans for a reader
#[utoipa::path(
    get,
    path = "/readers/{id}/loans",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Reader's open loans", body = Vec<LoanDetails>),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_reader_loans(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(reader_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_circulation()?;

    let loans = state.services.loans.get_reader_loans(reader_id).await?;
    Ok(Json(loans))
}

/// Check whether a reader may borrow
#[utoipa::path(
    get,
    path = "/readers/{id}/eligibility",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reader ID"),
        EligibilityQuery
    ),
    responses(
        (status = 200, description = "Eligibility with every failing reason", body = Eligibility),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_eligibility(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
    Path(reader_id): Path<i32>,
    Query(query): Query<EligibilityQuery>,
) -> AppResult<Json<Eligibility>> {
    claims.require_circulation()?;

    let eligibility = state
        .services
        .circulation
        .check_eligibility(reader_id, query.library_id)
        .await?;
    Ok(Json(eligibility))
}
