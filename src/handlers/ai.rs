use axum::{extract::Path, response::Json};
use once_cell::sync::Lazy;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AiResponse, FileStatus, TranslateParams};
use crate::registry::FILE_REGISTRY;
use crate::services::gemini::{is_supported_language, GeminiService};

/// Shared Gemini client; configuration is read once at first use.
pub static GEMINI: Lazy<GeminiService> = Lazy::new(GeminiService::from_env);

/// Requests AI insights for a registered item: ANALYZING while in flight,
/// back to IDLE with the insight text stored. Remote failures surface as
/// descriptive result strings, never as errors.
pub async fn analyze_handler(Path(id): Path<Uuid>) -> AppResult<Json<AiResponse>> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    let file = FILE_REGISTRY.begin(id, FileStatus::Analyzing).await?;

    info!(
        request_id = %request_id,
        item_id = %id,
        file_name = %file.name,
        "Starting AI analysis"
    );

    let text = GEMINI.analyze_file(&file).await;
    FILE_REGISTRY.store_insights(id, text.clone()).await;

    let elapsed = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        item_id = %id,
        response_chars = text.len(),
        total_time_ms = elapsed,
        "AI analysis completed"
    );

    Ok(Json(AiResponse::new(text, elapsed)))
}

/// Requests a translation for a registered item: TRANSLATING while in
/// flight, back to IDLE with the translation stored.
pub async fn translate_handler(
    Path(id): Path<Uuid>,
    Json(params): Json<TranslateParams>,
) -> AppResult<Json<AiResponse>> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    if !is_supported_language(&params.language) {
        return Err(AppError::validation(format!(
            "unsupported translation language: {}",
            params.language
        )));
    }

    let file = FILE_REGISTRY.begin(id, FileStatus::Translating).await?;

    info!(
        request_id = %request_id,
        item_id = %id,
        file_name = %file.name,
        language = %params.language,
        "Starting AI translation"
    );

    let text = GEMINI.translate_file(&file, &params.language).await;
    FILE_REGISTRY.store_translation(id, text.clone()).await;

    let elapsed = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        item_id = %id,
        response_chars = text.len(),
        total_time_ms = elapsed,
        "AI translation completed"
    );

    Ok(Json(AiResponse::new(text, elapsed)))
}
