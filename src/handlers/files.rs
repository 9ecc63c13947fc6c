use axum::{
    extract::{Multipart, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{FileItemView, SourceFile, UploadData, UploadResponse};
use crate::registry::FILE_REGISTRY;

/// Registers an uploaded file. The item starts idle; analysis, translation,
/// conversion and effects are triggered per item afterwards.
pub async fn upload_handler(mut multipart: Multipart) -> AppResult<Json<UploadResponse>> {
    let file = extract_file_from_multipart(&mut multipart).await?;

    info!(
        file_name = %file.name,
        file_size = file.size,
        mime_type = ?file.mime_type,
        category = file.category(),
        "File uploaded"
    );

    let name = file.name.clone();
    let size = file.size;
    let mime_type = file.mime_type.clone();
    let category = file.category().to_string();
    let is_image = file.is_image();

    let id = FILE_REGISTRY.insert(file).await;
    let preview_url = if is_image {
        Some(format!("/api/v1/files/{}/preview", id))
    } else {
        None
    };

    let view = FILE_REGISTRY
        .snapshot(id)
        .await
        .ok_or(AppError::ItemNotFound { id })?;

    Ok(Json(UploadResponse {
        success: true,
        data: UploadData {
            id,
            name,
            size,
            mime_type,
            category,
            status: view.status,
            preview_url,
        },
    }))
}

pub async fn get_file_handler(Path(id): Path<Uuid>) -> AppResult<Json<FileItemView>> {
    let view = FILE_REGISTRY
        .snapshot(id)
        .await
        .ok_or(AppError::ItemNotFound { id })?;
    Ok(Json(view))
}

/// Serves the original bytes as a preview while the item exists. Once the
/// item is removed the underlying resource is gone and this is a 404.
pub async fn preview_handler(Path(id): Path<Uuid>) -> AppResult<Response> {
    let file = FILE_REGISTRY
        .source(id)
        .await
        .ok_or(AppError::ItemNotFound { id })?;

    let mime = file
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    debug!(item_id = %id, mime_type = %mime, "Serving preview");

    Ok(([(header::CONTENT_TYPE, mime)], Bytes::from(file.content)).into_response())
}

/// Removes an item and releases its resources. Idempotent: deleting an
/// unknown id succeeds, and results from operations still in flight for
/// the removed id are dropped silently.
pub async fn delete_file_handler(Path(id): Path<Uuid>) -> StatusCode {
    FILE_REGISTRY.remove(id).await;
    StatusCode::NO_CONTENT
}

pub(crate) async fn extract_file_from_multipart(
    multipart: &mut Multipart,
) -> AppResult<SourceFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::InvalidFile {
        message: format!("Failed to read multipart field: {}", e),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let file_name = field.file_name().unwrap_or("unknown").to_string();

            let content_type = field.content_type().map(|ct| ct.to_string());

            let data = field.bytes().await.map_err(|e| AppError::InvalidFile {
                message: format!("Failed to read file data: {}", e),
            })?;

            if data.is_empty() {
                return Err(AppError::InvalidFile {
                    message: "File is empty".to_string(),
                });
            }

            let mut file = SourceFile::new(file_name, data.to_vec());

            if let Some(mime_type) = content_type {
                file = file.with_mime_type(mime_type);
            }

            check_file_size(&file)?;

            debug!(
                "Extracted file: {} ({} bytes, type: {:?})",
                file.name, file.size, file.mime_type
            );

            return Ok(file);
        }

        warn!("Ignoring unexpected multipart field: {}", field_name);
    }

    Err(AppError::MissingFile)
}

/// Double-checks the configured size limit (the body limit layer already
/// rejects oversized requests at the transport level).
pub(crate) fn check_file_size(file: &SourceFile) -> AppResult<()> {
    let config = Config::from_env()
        .map_err(|e| AppError::config(format!("Failed to load config: {}", e)))?;
    let max_size_bytes = config.max_file_size_mb * 1024 * 1024;
    if file.size > max_size_bytes {
        return Err(AppError::FileTooLarge {
            size: file.size / (1024 * 1024),
            limit: config.max_file_size_mb,
        });
    }
    Ok(())
}
