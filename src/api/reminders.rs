//! Reminder endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::reminders::ReminderReport, AppState};

use super::AuthenticatedStaff;

/// Run the overdue reminder batch now
#[utoipa::path(
    post,
    path = "/reminders/run",
    tag = "reminders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Batch counters", body = ReminderReport),
        (status = 403, description = "Missing circulation rights", body = crate::error::ErrorResponse)
    )
)]
pub async fn run_reminders(
    State(state): State<AppState>,
    AuthenticatedStaff(claims): AuthenticatedStaff,
) -> AppResult<Json<ReminderReport>> {
    claims.require_circulation()?;

    tracing::info!(staff_id = claims.staff_id, "Reminder batch requested");
    let report = state.services.reminders.run_batch().await?;
    Ok(Json(report))
}
