use actix_web::{web, HttpResponse, ResponseError};

use crate::api::metrics;
use crate::models::{AssignmentView, CheckAssignmentRequest, CreateAssignmentRequest};
use crate::services::AssignmentService;
use crate::utils::AppError;

/// Logs and renders a failed call. Internal failures are logged with their
/// kind only; the response never carries more than the fixed message.
pub(crate) fn failure(action: &str, email: &str, err: AppError) -> HttpResponse {
    metrics::increment_error_count();
    if err.is_internal() {
        log::error!("❌ {} failed: {} - {}", action, email, err.kind());
    } else {
        log::warn!("❌ {} rejected: {} - {}", action, email, err);
    }
    err.error_response()
}

pub(crate) async fn run_create(
    service: &AssignmentService,
    request: &CreateAssignmentRequest,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");

    match service.create_assignment(request).await {
        Ok(view) => {
            log::info!("✅ Assignment created: {}", email);
            HttpResponse::Ok().json(view)
        }
        Err(e) => failure("Create assignment", email, e),
    }
}

pub(crate) async fn run_check(
    service: &AssignmentService,
    request: &CheckAssignmentRequest,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");

    match service.check_assignment(request).await {
        Ok(view) => {
            log::info!("✅ Assignment retrieved: {}", email);
            HttpResponse::Ok().json(view)
        }
        Err(e) => failure("Check assignment", email, e),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    tag = "Assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 200, description = "Recipient drawn and stored", body = AssignmentView),
        (status = 400, description = "Missing or blank field"),
        (status = 404, description = "No suitable names left in the pool"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Assignment transaction aborted"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn create_assignment(
    service: web::Data<AssignmentService>,
    request: web::Json<CreateAssignmentRequest>,
) -> HttpResponse {
    metrics::increment_request_count();
    log::info!(
        "🎁 POST /assignments - email: {}",
        request.email.as_deref().unwrap_or("N/A")
    );

    run_create(&service, &request).await
}

#[utoipa::path(
    post,
    path = "/api/v1/assignments/check",
    tag = "Assignments",
    request_body = CheckAssignmentRequest,
    responses(
        (status = 200, description = "Stored assignment", body = AssignmentView),
        (status = 400, description = "Missing or blank field"),
        (status = 401, description = "Invalid email or password"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn check_assignment(
    service: web::Data<AssignmentService>,
    request: web::Json<CheckAssignmentRequest>,
) -> HttpResponse {
    metrics::increment_request_count();
    log::info!(
        "🔎 POST /assignments/check - email: {}",
        request.email.as_deref().unwrap_or("N/A")
    );

    run_check(&service, &request).await
}
