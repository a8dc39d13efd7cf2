//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::loans::LoanStats, AppState};

use super::AuthenticatedStaff;

/// Open and overdue loan counters
#[utoipa::path(
    get,
    path = "/stats/loans",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan counters", body = LoanStats)
    )
)]
pub async fn get_loan_stats(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
) -> AppResult<Json<LoanStats>> {
    claims.require_circulation()?;

    let stats = state.services.loans.loan_stats().await?;
    Ok(Json(stats))
}
