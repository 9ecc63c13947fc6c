use serde::{Deserialize, Serialize};

/// Image mime types the service treats as raster/vector image inputs.
/// Everything else is handled as a generic text/document candidate.
pub const SUPPORTED_IMAGE_TYPES: [&str; 12] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
    "image/bmp",
    "image/x-icon",
    "image/vnd.microsoft.icon",
    "image/tiff",
    "image/avif",
    "image/heic",
    "image/heif",
];

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: usize,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
}

impl SourceFile {
    pub fn new(name: String, content: Vec<u8>) -> Self {
        let size = content.len();
        Self {
            name,
            size,
            content,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: String) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|mt| SUPPORTED_IMAGE_TYPES.contains(&mt))
            .unwrap_or(false)
    }

    pub fn is_svg(&self) -> bool {
        self.mime_type.as_deref() == Some("image/svg+xml")
    }

    pub fn category(&self) -> &'static str {
        if self.is_image() {
            "image"
        } else {
            "document"
        }
    }

    /// Original file name up to the first dot, used to synthesize the
    /// download name `processed_<base>.<ext>`.
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or("file")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertParams {
    pub target_format: String,
    pub quality: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EffectParams {
    pub corner_radius_percent: u8,
    #[serde(default)]
    pub enhance: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslateParams {
    pub language: String,
}

impl ConvertParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.target_format.trim().is_empty() {
            return Err("target_format must not be empty".to_string());
        }
        if let Some(q) = self.quality {
            if !(0.0..=1.0).contains(&q) {
                return Err(format!("quality must be within [0, 1], got {}", q));
            }
        }
        Ok(())
    }
}

impl EffectParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.corner_radius_percent > 100 {
            return Err(format!(
                "corner_radius_percent must be within 0-100, got {}",
                self.corner_radius_percent
            ));
        }
        Ok(())
    }
}
