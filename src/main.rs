mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Settings;
use crate::database::{AssignmentStore, MemoryStore, MongoDB};
use crate::services::AssignmentService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🎅 Starting Secret Santa Service...");

    let store: Arc<dyn AssignmentStore> = if settings.uses_memory_store() {
        log::warn!("⚠️  Using in-memory store, assignments are lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        log::info!("📊 Database: {}", settings.database_name);
        let db = MongoDB::new(
            &settings.database_url,
            &settings.database_name,
            settings.transaction_commit_timeout,
        )
        .await
        .map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            io::Error::new(io::ErrorKind::ConnectionRefused, e)
        })?;
        log::info!("✅ MongoDB connected successfully");
        Arc::new(db)
    };

    let service = AssignmentService::new(store, settings.bcrypt_cost).map_err(|e| {
        log::error!("❌ Failed to initialise password hashing: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    // 🌱 Seed the name pool (only when none exists yet)
    if let Some(path) = &settings.pool_seed_file {
        seeds::name_pool_seed::seed_name_pool(service.store(), path).await;
    }

    let service_data = web::Data::new(service);
    let allowed_origins = settings.allowed_origins.clone();
    let bind_address = settings.bind_address();

    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(service_data.clone())
            .app_data(api::json_config())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
