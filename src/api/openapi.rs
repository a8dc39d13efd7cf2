//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans, readers, reminders, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulation API",
        version = "1.0.0",
        description = "Loan circulation for the community library network",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::create_loan,
        loans::get_loan,
        loans::renew_loan,
        loans::return_loan,
        loans::renew_copy,
        loans::return_copy,
        loans::get_notification,
        loans::record_notification,
        // Readers
        readers::get_reader_loans,
        readers::get_eligibility,
        // Reminders
        reminders::run_reminders,
        // Stats
        stats::get_loan_stats,
    ),
    components(
        schemas(
            // Loans
            crate::models::Loan,
            crate::models::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::LoanDetails,
            crate::circulation::LoanOutcome,
            crate::circulation::ReturnOutcome,
            crate::circulation::AuditStatus,
            loans::NotificationStatus,
            // Readers
            crate::circulation::Eligibility,
            crate::circulation::IneligibilityReason,
            // Reminders
            crate::services::reminders::ReminderReport,
            // Stats
            crate::services::loans::LoanStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "readers", description = "Reader loans and eligibility"),
        (name = "reminders", description = "Overdue reminders"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_circulation_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/loans", "/loans/{id}/renew", "/copies/{id}/return", "/readers/{id}/eligibility"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
