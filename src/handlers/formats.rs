use axum::response::Json;

use crate::error::AppResult;
use crate::models::{FormatsResponse, LanguageEntry};
use crate::services::gemini::LANGUAGES;
use crate::services::image_converter::{OutputFormat, QUALITY_PRESETS};
use crate::services::text_converter::document_targets;

/// Enumerates the fixed conversion targets, quality presets and
/// translation languages.
pub async fn formats_handler() -> AppResult<Json<FormatsResponse>> {
    let response = FormatsResponse {
        image_targets: OutputFormat::names(),
        document_targets: document_targets(),
        quality_presets: QUALITY_PRESETS.to_vec(),
        languages: LANGUAGES
            .iter()
            .map(|l| LanguageEntry {
                name: l.name.to_string(),
                code: l.code.to_string(),
            })
            .collect(),
    };
    Ok(Json(response))
}
