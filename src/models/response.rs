use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::FileStatus;

/// Binary artifact produced by a conversion or effect operation.
/// Owned by the caller once returned; never shared between operations.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub data: Bytes,
    pub mime_type: String,
    pub file_name: String,
}

impl ConversionResult {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, file_name: String) -> Self {
        Self {
            data: Bytes::from(data),
            mime_type: mime_type.into(),
            file_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: UploadData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadData {
    pub id: Uuid,
    pub name: String,
    pub size: usize,
    pub mime_type: Option<String>,
    pub category: String,
    pub status: FileStatus,
    pub preview_url: Option<String>,
}

/// Serializable snapshot of a registered file item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileItemView {
    pub id: Uuid,
    pub name: String,
    pub size: usize,
    pub mime_type: Option<String>,
    pub category: String,
    pub status: FileStatus,
    pub ai_insights: Option<String>,
    pub translation: Option<String>,
    pub output_format: Option<String>,
    pub has_artifact: bool,
    pub preview_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AiResponse {
    pub success: bool,
    pub data: AiData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AiData {
    pub text: String,
}

impl AiResponse {
    pub fn new(text: String, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data: AiData { text },
            processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormatsResponse {
    pub image_targets: Vec<String>,
    pub document_targets: Vec<String>,
    pub quality_presets: Vec<f32>,
    pub languages: Vec<LanguageEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
}
