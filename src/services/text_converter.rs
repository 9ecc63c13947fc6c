use serde_json::json;
use tracing::{debug, warn};

use crate::models::{ConversionResult, SourceFile};
use crate::services::image_converter::output_file_name;

/// Target names accepted for non-image files. Only "json" carries a real
/// transform; the rest are deliberate pass-throughs for formats without
/// content transformation logic.
pub const DOCUMENT_TARGETS: [&str; 5] = ["txt", "md", "json", "html", "xml"];

/// Output mime for every document target; results are retagged as
/// generic text regardless of the requested extension.
const OUTPUT_MIME: &str = "text/plain";

/// Converts a non-image file to the named target. The "json" target wraps
/// the text as a single-key object with 2-space indentation; every other
/// target returns the content unchanged. Infallible: a JSON serialization
/// failure falls back to the raw text rather than failing the call.
pub fn convert_text(file: &SourceFile, target_format: &str) -> ConversionResult {
    let data = if target_format == "json" {
        let text = String::from_utf8_lossy(&file.content);
        match serde_json::to_string_pretty(&json!({ "content": text })) {
            Ok(wrapped) => wrapped.into_bytes(),
            Err(e) => {
                warn!(file_name = %file.name, error = %e, "JSON wrapping failed, passing content through");
                file.content.clone()
            }
        }
    } else {
        file.content.clone()
    };

    debug!(
        file_name = %file.name,
        target = target_format,
        output_bytes = data.len(),
        "Text conversion completed"
    );

    ConversionResult::new(data, OUTPUT_MIME, output_file_name(file, target_format))
}

pub fn is_document_target(name: &str) -> bool {
    DOCUMENT_TARGETS.contains(&name)
}

pub fn document_targets() -> Vec<String> {
    DOCUMENT_TARGETS.iter().map(|s| s.to_string()).collect()
}
