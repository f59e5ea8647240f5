pub mod assignments;
pub mod health;
pub mod metrics;
pub mod santa;
pub mod swagger;

use actix_web::web;

use crate::utils::AppError;

/// Malformed bodies get the same structured error as blank fields.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("❌ Rejected request body: {}", err);
        metrics::increment_error_count();
        AppError::Validation("Invalid request body".to_string()).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Original client contract
        .route("/api/santa", web::post().to(santa::santa))
        .route("/api/recheck", web::post().to(assignments::check_assignment))
        .service(
            web::scope("/api/v1/assignments")
                .route("", web::post().to(assignments::create_assignment))
                .route("/check", web::post().to(assignments::check_assignment)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::Person;
    use crate::services::AssignmentService;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn person(name: &str) -> Person {
        Person {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            drive_link: format!("https://drive.example/{}", name.to_lowercase()),
            description: format!("{} wants mittens", name),
        }
    }

    fn service_data(people: Vec<Person>) -> web::Data<AssignmentService> {
        let store = Arc::new(MemoryStore::with_pool(people));
        web::Data::new(AssignmentService::new(store, 4).unwrap())
    }

    macro_rules! app {
        ($data:expr) => {
            test::init_service(
                App::new()
                    .app_data($data.clone())
                    .app_data(json_config())
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_create_and_check_over_http() {
        let data = service_data(vec![person("Alice"), person("Bob")]);
        let app = app!(data);

        let req = test::TestRequest::post()
            .uri("/api/v1/assignments")
            .set_json(json!({ "email": "Alice@Example.com", "password": "pw", "name": "Alice" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["name"], "Bob");
        assert_eq!(created["driveLink"], "https://drive.example/bob");
        assert!(created.get("password").is_none());

        let req = test::TestRequest::post()
            .uri("/api/v1/assignments/check")
            .set_json(json!({ "email": "alice@example.com", "password": "pw" }))
            .to_request();
        let checked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(checked, created);
    }

    #[actix_web::test]
    async fn test_error_kinds_and_statuses() {
        let data = service_data(vec![person("Bob")]);
        let app = app!(data);

        let cases = [
            (
                "/api/v1/assignments",
                json!({ "email": "a@x.com", "password": "pw" }),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                "/api/v1/assignments",
                json!({ "email": "a@x.com", "password": "pw", "name": "Ann" }),
                StatusCode::OK,
                "",
            ),
            (
                "/api/v1/assignments",
                json!({ "email": "A@X.com", "password": "pw", "name": "Ann" }),
                StatusCode::CONFLICT,
                "duplicate_registration",
            ),
            (
                "/api/v1/assignments",
                json!({ "email": "c@x.com", "password": "pw", "name": "Cat" }),
                StatusCode::NOT_FOUND,
                "pool_exhausted",
            ),
            (
                "/api/v1/assignments/check",
                json!({ "email": "a@x.com", "password": "nope" }),
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
            ),
        ];

        for (uri, body, status, kind) in cases {
            let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), status, "{}", uri);
            if !kind.is_empty() {
                let body: Value = test::read_body_json(res).await;
                assert_eq!(body["kind"], kind);
                assert_eq!(body["success"], false);
            }
        }
    }

    #[actix_web::test]
    async fn test_santa_endpoint_dispatches_on_action() {
        let data = service_data(vec![person("Alice"), person("Bob")]);
        let app = app!(data);

        let req = test::TestRequest::post()
            .uri("/api/santa")
            .set_json(json!({ "action": "create", "email": "bob@x.com", "password": "pw", "name": "Bob" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["name"], "Alice");

        let req = test::TestRequest::post()
            .uri("/api/santa")
            .set_json(json!({ "action": "check", "email": "bob@x.com", "password": "pw" }))
            .to_request();
        let checked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(checked["name"], "Alice");

        let req = test::TestRequest::post()
            .uri("/api/santa")
            .set_json(json!({ "action": "delete", "email": "bob@x.com", "password": "pw" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid action");
    }

    #[actix_web::test]
    async fn test_recheck_route_matches_check() {
        let data = service_data(vec![person("Alice"), person("Bob")]);
        let app = app!(data);

        let req = test::TestRequest::post()
            .uri("/api/v1/assignments")
            .set_json(json!({ "email": "bob@x.com", "password": "pw", "name": "Bob" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/recheck")
            .set_json(json!({ "email": "BOB@x.com", "password": "pw" }))
            .to_request();
        let rechecked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rechecked, created);

        let req = test::TestRequest::post()
            .uri("/api/recheck")
            .set_json(json!({ "email": "bob@x.com", "password": "nope" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["kind"], "invalid_credentials");
    }

    #[actix_web::test]
    async fn test_malformed_json_is_a_validation_error() {
        let data = service_data(vec![person("Bob")]);
        let app = app!(data);

        let req = test::TestRequest::post()
            .uri("/api/v1/assignments")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["kind"], "validation_error");
    }

    #[actix_web::test]
    async fn test_health_reports_database_status() {
        let data = service_data(vec![]);
        let app = app!(data);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "up");
    }
}
