use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static ASSIGNMENTS_CREATED: AtomicU64 = AtomicU64::new(0);
static ASSIGNMENT_CHECKS: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_assignments_created() {
    ASSIGNMENTS_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_assignment_checks() {
    ASSIGNMENT_CHECKS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub assignments_created_total: u64,
    pub assignment_checks_total: u64,
}

impl MetricsResponse {
    fn snapshot() -> Self {
        Self {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            assignments_created_total: ASSIGNMENTS_CREATED.load(Ordering::Relaxed),
            assignment_checks_total: ASSIGNMENT_CHECKS.load(Ordering::Relaxed),
        }
    }

    fn to_prometheus(&self) -> String {
        format!(
            "# HELP http_requests_total Total number of HTTP requests\n\
             # TYPE http_requests_total counter\n\
             http_requests_total {}\n\
             \n\
             # HELP http_errors_total Total number of HTTP errors\n\
             # TYPE http_errors_total counter\n\
             http_errors_total {}\n\
             \n\
             # HELP assignments_created_total Recipients drawn from the pool\n\
             # TYPE assignments_created_total counter\n\
             assignments_created_total {}\n\
             \n\
             # HELP assignment_checks_total Assignment lookups attempted\n\
             # TYPE assignment_checks_total counter\n\
             assignment_checks_total {}\n",
            self.http_requests_total,
            self.http_errors_total,
            self.assignments_created_total,
            self.assignment_checks_total
        )
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().to_prometheus())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_output_lists_every_counter() {
        let text = MetricsResponse {
            http_requests_total: 5,
            http_errors_total: 2,
            assignments_created_total: 3,
            assignment_checks_total: 1,
        }
        .to_prometheus();

        assert!(text.contains("http_requests_total 5\n"));
        assert!(text.contains("http_errors_total 2\n"));
        assert!(text.contains("assignments_created_total 3\n"));
        assert!(text.contains("assignment_checks_total 1\n"));
    }
}
