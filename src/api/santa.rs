use actix_web::{web, HttpResponse};

use crate::api::assignments::{failure, run_check, run_create};
use crate::api::metrics;
use crate::models::{AssignmentView, CheckAssignmentRequest, CreateAssignmentRequest, SantaRequest};
use crate::services::AssignmentService;
use crate::utils::AppError;

/// POST /api/santa - `action` picks between registering and checking.
#[utoipa::path(
    post,
    path = "/api/santa",
    tag = "Assignments",
    request_body = SantaRequest,
    responses(
        (status = 200, description = "Assignment created or retrieved", body = AssignmentView),
        (status = 400, description = "Missing field or invalid action"),
        (status = 401, description = "Invalid email or password"),
        (status = 404, description = "No suitable names left in the pool"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Assignment transaction aborted")
    )
)]
pub async fn santa(
    service: web::Data<AssignmentService>,
    request: web::Json<SantaRequest>,
) -> HttpResponse {
    metrics::increment_request_count();
    let request = request.into_inner();
    let action = request.action.clone();
    let email = request.email.clone().unwrap_or_else(|| "N/A".to_string());
    log::info!(
        "🎅 POST /api/santa - action: {}, email: {}",
        action.as_deref().unwrap_or("N/A"),
        email
    );

    match action.as_deref() {
        Some("create") => run_create(&service, &CreateAssignmentRequest::from(request)).await,
        Some("check") => run_check(&service, &CheckAssignmentRequest::from(request)).await,
        _ => failure(
            "Santa action",
            &email,
            AppError::Validation("Invalid action".to_string()),
        ),
    }
}
