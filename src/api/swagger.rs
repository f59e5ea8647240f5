use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Secret Santa Service API",
        version = "1.0.0",
        description = "Draws a random recipient for each registrant from a shared name pool and lets them look it up again later.\n\n**Credentials:** registration stores an email/password pair; the same pair retrieves the assignment.\n\n**Errors:** every failure returns `{ success: false, kind, error }`.",
    ),
    paths(
        // Assignments
        crate::api::assignments::create_assignment,
        crate::api::assignments::check_assignment,
        crate::api::santa::santa,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::CreateAssignmentRequest,
            crate::models::CheckAssignmentRequest,
            crate::models::SantaRequest,
            crate::models::AssignmentView,

            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Assignments", description = "Register to draw a recipient, or check the one already drawn."),
        (name = "Health", description = "Health check and counters for monitoring."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_assignment_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/assignments"));
        assert!(doc.paths.paths.contains_key("/api/v1/assignments/check"));
        assert!(doc.paths.paths.contains_key("/api/santa"));
    }
}
