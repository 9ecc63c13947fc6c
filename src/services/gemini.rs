use base64::Engine;
use serde_json::{json, Value};
use std::env;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::SourceFile;

/// Maximum characters submitted for text translation, to stay inside the
/// model's token budget. Oversized inputs are truncated, not rejected.
pub const MAX_TRANSLATION_CHARS: usize = 30_000;

/// Marker appended to truncated translation inputs.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated due to size limits ...]";

#[derive(Debug, Clone, Copy)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

/// Translation targets offered to clients. The codes are informational;
/// prompts address languages by name.
pub const LANGUAGES: [Language; 8] = [
    Language { name: "French", code: "fr" },
    Language { name: "English", code: "en" },
    Language { name: "Spanish", code: "es" },
    Language { name: "German", code: "de" },
    Language { name: "Chinese", code: "zh" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
];

pub fn is_supported_language(name: &str) -> bool {
    LANGUAGES.iter().any(|l| l.name.eq_ignore_ascii_case(name))
}

/// Client for the Gemini `generateContent` endpoint.
///
/// Best-effort, single round trip, no retry. The public operations never
/// fail: remote errors are folded into descriptive result strings so the
/// caller has a uniform success path.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiService {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env::var("GEMINI_API_KEY").unwrap_or_default(),
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
        )
    }

    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Requests a short descriptive insight for a file. Image inputs are
    /// attached inline as base64.
    pub async fn analyze_file(&self, file: &SourceFile) -> String {
        let mime = file.mime_type.as_deref().unwrap_or("application/octet-stream");
        let prompt = format!(
            "Analyze this file: \"{}\" (Type: {}). \n\
             1. Briefly explain what kind of file it is.\n\
             2. Suggest the best 3 target formats for conversion and why.\n\
             3. If it contains text or is an image with text, mention that it can be translated.\n\
             Keep the total response under 50 words.",
            file.name, mime
        );

        let mut parts = vec![json!({ "text": prompt })];
        if let Some(inline) = inline_image_part(file) {
            parts.push(inline);
        }

        match self.generate(parts, 0.4).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "No analysis available.".to_string(),
            Err(e) => {
                warn!(file_name = %file.name, error = %e, "Gemini analysis failed");
                if is_token_budget_error(&e) {
                    "File is too complex for AI analysis.".to_string()
                } else {
                    "AI was unable to analyze this file.".to_string()
                }
            }
        }
    }

    /// Requests a translation of the file content (or of the text found
    /// in an image) into the named language. Text inputs are truncated to
    /// the character budget before submission.
    pub async fn translate_file(&self, file: &SourceFile, target_language: &str) -> String {
        let subject = if file.is_image() {
            "text found in this image"
        } else {
            "content of this file"
        };
        let prompt = format!(
            "Translate the {} into {}. \n\
             Provide only the translated text. Maintain the original tone and structure as much as possible. \n\
             If it's a technical file (JSON/XML), translate only the values, not the keys.",
            subject, target_language
        );

        let mut parts = vec![json!({ "text": prompt })];
        if file.is_image() {
            if let Some(inline) = inline_image_part(file) {
                parts.push(inline);
            }
        } else {
            let text = truncate_for_translation(&String::from_utf8_lossy(&file.content));
            parts.push(json!({ "text": format!("Content to translate: \n\n {}", text) }));
        }

        match self.generate(parts, 0.3).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "Translation failed.".to_string(),
            Err(e) => {
                warn!(file_name = %file.name, error = %e, "Gemini translation failed");
                if is_token_budget_error(&e) {
                    "Error: The file is too large or contains too much text for the AI to \
                     translate in one go. Please try with a smaller file."
                        .to_string()
                } else {
                    "Error: Failed to process translation. Please try again with a simpler file."
                        .to_string()
                }
            }
        }
    }

    async fn generate(&self, parts: Vec<Value>, temperature: f32) -> AppResult<String> {
        if self.api_key.is_empty() {
            return Err(AppError::ai_request("GEMINI_API_KEY is not configured"));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "temperature": temperature }
        });

        debug!(model = %self.model, "Dispatching generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ai_request(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ai_request(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::ai_request(format!("invalid response body: {}", e)))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        info!(response_chars = text.len(), "Gemini request completed");
        Ok(text)
    }
}

/// Truncates oversized translation input to the character budget and
/// appends the truncation marker. Inputs at or below the budget pass
/// through unchanged; the result is deterministic for a given input.
pub fn truncate_for_translation(text: &str) -> String {
    if text.chars().count() <= MAX_TRANSLATION_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_TRANSLATION_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Builds the inline base64 image part for image files. SVG is skipped:
/// the model does not accept it and the upstream habit of relabeling SVG
/// bytes as PNG sends data the declared type does not match.
fn inline_image_part(file: &SourceFile) -> Option<Value> {
    if !file.is_image() {
        return None;
    }
    if file.is_svg() {
        warn!(file_name = %file.name, "Skipping inline submission for SVG input");
        return None;
    }
    let mime = file.mime_type.as_deref()?;
    let data = base64::engine::general_purpose::STANDARD.encode(&file.content);
    Some(json!({
        "inlineData": {
            "mimeType": mime,
            "data": data
        }
    }))
}

fn is_token_budget_error(err: &AppError) -> bool {
    err.to_string().contains("token count")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_only_touches_oversized_input() {
        let at_budget: String = "a".repeat(MAX_TRANSLATION_CHARS);
        assert_eq!(truncate_for_translation(&at_budget), at_budget);

        let oversized: String = "b".repeat(MAX_TRANSLATION_CHARS + 1);
        let truncated = truncate_for_translation(&oversized);
        assert_eq!(
            truncated.chars().count(),
            MAX_TRANSLATION_CHARS + TRUNCATION_MARKER.chars().count()
        );
        assert!(truncated.ends_with(TRUNCATION_MARKER));

        // Deterministic across repeated calls.
        assert_eq!(truncate_for_translation(&oversized), truncated);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        assert!(is_supported_language("French"));
        assert!(is_supported_language("japanese"));
        assert!(!is_supported_language("Klingon"));
    }
}
