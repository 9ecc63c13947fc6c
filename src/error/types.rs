use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::FileStatus;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Rate limit exceeded: maximum concurrent requests reached")]
    RateLimitExceeded,

    #[error("Image decoding failed: {message}")]
    Decode { message: String },

    #[error("Image encoding failed: {message}")]
    Encode { message: String },

    #[error("Drawing surface unavailable: {message}")]
    Surface { message: String },

    #[error("AI request failed: {message}")]
    AiRequest { message: String },

    #[error("File item not found: {id}")]
    ItemNotFound { id: Uuid },

    #[error("File item is busy: an operation is already in progress ({status:?})")]
    ItemBusy { status: FileStatus },

    #[error("Missing or invalid content type")]
    InvalidContentType,

    #[error("Missing file in request")]
    MissingFile,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::Decode { .. } => "DECODE_ERROR",
            AppError::Encode { .. } => "ENCODE_ERROR",
            AppError::Surface { .. } => "SURFACE_ERROR",
            AppError::AiRequest { .. } => "AI_REQUEST_ERROR",
            AppError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            AppError::ItemBusy { .. } => "ITEM_BUSY",
            AppError::InvalidContentType => "INVALID_CONTENT_TYPE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Encode { .. } => StatusCode::BAD_REQUEST,
            AppError::Surface { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AiRequest { .. } => StatusCode::BAD_GATEWAY,
            AppError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ItemBusy { .. } => StatusCode::CONFLICT,
            AppError::InvalidContentType => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        // Structured logging with context
        tracing::error!(
            error_code = error_code,
            status_code = %status,
            request_id = %request_id,
            error_message = %message,
            "API error occurred"
        );

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

// Convert common errors to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: format!("JSON parsing error: {}", err),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        AppError::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        AppError::Encode {
            message: message.into(),
        }
    }

    pub fn surface(message: impl Into<String>) -> Self {
        AppError::Surface {
            message: message.into(),
        }
    }

    pub fn ai_request(message: impl Into<String>) -> Self {
        AppError::AiRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
