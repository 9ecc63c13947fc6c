use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::time::SystemTime;
use tracing::info;

use crate::error::AppResult;
use crate::handlers::ai::GEMINI;
use crate::middleware::rate_limit::get_rate_limit_metrics;

/// Health check endpoint
pub async fn health_handler() -> AppResult<Json<Value>> {
    info!("Health check requested");

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    // The converters are pure in-process services; only the AI collaborator
    // can be unavailable.
    let gemini_available = GEMINI.is_available();

    let (total_requests, rejected_requests, available_permits) = get_rate_limit_metrics();

    let status = if gemini_available { "healthy" } else { "degraded" };

    let response = json!({
        "status": status,
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "image_converter": true,
            "text_converter": true,
            "gemini": gemini_available
        },
        "rate_limiting": {
            "total_requests": total_requests,
            "rejected_requests": rejected_requests,
            "available_permits": available_permits,
            "rejection_rate": if total_requests > 0 {
                (rejected_requests as f64 / total_requests as f64 * 100.0).round() / 100.0
            } else {
                0.0
            }
        }
    });

    info!(
        status = status,
        gemini_available = gemini_available,
        "Health check completed"
    );

    Ok(Json(response))
}

/// Readiness check endpoint (for Kubernetes/Railway)
pub async fn ready_handler() -> StatusCode {
    // Converters are always ready; AI unavailability only degrades.
    StatusCode::OK
}
