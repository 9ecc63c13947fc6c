use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::env;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod registry;
mod services;

use config::Config;
use handlers::{
    analyze_handler, convert_handler, convert_item_handler, delete_file_handler,
    download_handler, effects_handler, formats_handler, get_file_handler, health_handler,
    preview_handler, ready_handler, translate_handler, upload_handler,
};
use middleware::auth::auth_middleware;
use middleware::logging::logging_middleware;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "morph=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Morph File Conversion Service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);

    // Build our application with routes
    let app = Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // API endpoints (auth required)
        .route("/api/v1/formats", get(formats_handler))
        .route("/api/v1/convert", post(convert_handler))
        .route("/api/v1/files", post(upload_handler))
        .route(
            "/api/v1/files/:id",
            get(get_file_handler).delete(delete_file_handler),
        )
        .route("/api/v1/files/:id/preview", get(preview_handler))
        .route("/api/v1/files/:id/analyze", post(analyze_handler))
        .route("/api/v1/files/:id/translate", post(translate_handler))
        .route("/api/v1/files/:id/convert", post(convert_item_handler))
        .route("/api/v1/files/:id/effects", post(effects_handler))
        .route("/api/v1/files/:id/download", get(download_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(config.max_file_size_mb * 1024 * 1024))
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(axum::middleware::from_fn(auth_middleware)),
        );

    // Determine port from environment (Railway compatibility)
    let port = env::var("PORT")
        .unwrap_or_else(|_| config.server_port.to_string())
        .parse::<u16>()
        .unwrap_or(config.server_port);

    let host = config.server_host;
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
