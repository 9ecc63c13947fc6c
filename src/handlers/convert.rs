use axum::{
    extract::{Multipart, Path},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rate_limit::{record_rejection, record_request, REQUEST_SEMAPHORE};
use crate::models::{ConversionResult, ConvertParams, EffectParams, FileStatus, SourceFile};
use crate::registry::FILE_REGISTRY;
use crate::services::{image_converter, text_converter};

/// One-shot conversion: multipart upload with `file`, `target_format` and
/// optional `quality` fields, returning the artifact directly without
/// registering the file.
pub async fn convert_handler(mut multipart: Multipart) -> AppResult<Response> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    info!(request_id = %request_id, "Starting one-shot conversion request");

    let _permit = acquire_permit(&request_id)?;

    let (file, params) = extract_conversion_request(&mut multipart).await?;
    params.validate().map_err(AppError::validation)?;

    info!(
        request_id = %request_id,
        file_name = %file.name,
        file_size = file.size,
        target = %params.target_format,
        "File extracted from multipart form"
    );

    let artifact = run_conversion(&file, &params)?;

    info!(
        request_id = %request_id,
        output_bytes = artifact.data.len(),
        output_mime = %artifact.mime_type,
        total_time_ms = start.elapsed().as_millis() as u64,
        "One-shot conversion completed"
    );

    Ok(artifact_response(artifact))
}

/// Converts a registered item: CONVERTING while in flight, COMPLETED with
/// a stored artifact on success, ERROR on failure.
pub async fn convert_item_handler(
    Path(id): Path<Uuid>,
    Json(params): Json<ConvertParams>,
) -> AppResult<Response> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    params.validate().map_err(AppError::validation)?;

    let _permit = acquire_permit(&request_id)?;

    let file = FILE_REGISTRY.begin(id, FileStatus::Converting).await?;

    info!(
        request_id = %request_id,
        item_id = %id,
        file_name = %file.name,
        target = %params.target_format,
        "Starting item conversion"
    );

    match run_conversion(&file, &params) {
        Ok(artifact) => {
            FILE_REGISTRY
                .store_artifact(id, params.target_format.clone(), artifact.clone())
                .await;
            info!(
                request_id = %request_id,
                item_id = %id,
                output_bytes = artifact.data.len(),
                total_time_ms = start.elapsed().as_millis() as u64,
                "Item conversion completed"
            );
            Ok(artifact_response(artifact))
        }
        Err(e) => {
            error!(request_id = %request_id, item_id = %id, error = %e, "Item conversion failed");
            FILE_REGISTRY.mark_error(id).await;
            Err(e)
        }
    }
}

/// Applies the effect pipeline to a registered image item: PROCESSING
/// while in flight, COMPLETED with a stored PNG artifact on success.
pub async fn effects_handler(
    Path(id): Path<Uuid>,
    Json(params): Json<EffectParams>,
) -> AppResult<Response> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    params.validate().map_err(AppError::validation)?;

    let _permit = acquire_permit(&request_id)?;

    let file = FILE_REGISTRY.begin(id, FileStatus::Processing).await?;

    info!(
        request_id = %request_id,
        item_id = %id,
        file_name = %file.name,
        corner_radius_percent = params.corner_radius_percent,
        enhance = params.enhance,
        "Starting effect processing"
    );

    match image_converter::apply_effects(&file, &params) {
        Ok(artifact) => {
            FILE_REGISTRY
                .store_artifact(id, "png".to_string(), artifact.clone())
                .await;
            info!(
                request_id = %request_id,
                item_id = %id,
                output_bytes = artifact.data.len(),
                total_time_ms = start.elapsed().as_millis() as u64,
                "Effect processing completed"
            );
            Ok(artifact_response(artifact))
        }
        Err(e) => {
            error!(request_id = %request_id, item_id = %id, error = %e, "Effect processing failed");
            FILE_REGISTRY.mark_error(id).await;
            Err(e)
        }
    }
}

/// Returns the last stored artifact for an item.
pub async fn download_handler(Path(id): Path<Uuid>) -> AppResult<Response> {
    let artifact = FILE_REGISTRY
        .artifact(id)
        .await
        .ok_or(AppError::ItemNotFound { id })?;
    Ok(artifact_response(artifact))
}

/// Dispatches by input category: raster re-encode for images, pass-through
/// conversion for everything else.
fn run_conversion(file: &SourceFile, params: &ConvertParams) -> AppResult<ConversionResult> {
    if file.is_image() {
        image_converter::convert_image(file, params)
    } else {
        if !text_converter::is_document_target(&params.target_format) {
            return Err(AppError::validation(format!(
                "unsupported document target format: {}",
                params.target_format
            )));
        }
        Ok(text_converter::convert_text(file, &params.target_format))
    }
}

fn artifact_response(artifact: ConversionResult) -> Response {
    let headers = [
        (header::CONTENT_TYPE, artifact.mime_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        ),
    ];
    (headers, artifact.data).into_response()
}

fn acquire_permit(request_id: &str) -> AppResult<tokio::sync::SemaphorePermit<'static>> {
    let total = record_request();
    REQUEST_SEMAPHORE.try_acquire().map_err(|_| {
        let rejected = record_rejection();
        warn!(
            request_id = %request_id,
            total_requests = total,
            rejected_requests = rejected,
            "Rate limit exceeded"
        );
        AppError::RateLimitExceeded
    })
}

async fn extract_conversion_request(
    multipart: &mut Multipart,
) -> AppResult<(SourceFile, ConvertParams)> {
    let mut file: Option<SourceFile> = None;
    let mut target_format: Option<String> = None;
    let mut quality: Option<f32> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::InvalidFile {
        message: format!("Failed to read multipart field: {}", e),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
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
                let mut f = SourceFile::new(file_name, data.to_vec());
                if let Some(mime_type) = content_type {
                    f = f.with_mime_type(mime_type);
                }
                crate::handlers::files::check_file_size(&f)?;
                file = Some(f);
            }
            "target_format" => {
                let value = field.text().await.map_err(|e| {
                    AppError::validation(format!("Failed to read target_format field: {}", e))
                })?;
                target_format = Some(value);
            }
            "quality" => {
                let value = field.text().await.map_err(|e| {
                    AppError::validation(format!("Failed to read quality field: {}", e))
                })?;
                quality = Some(value.parse::<f32>().map_err(|e| {
                    AppError::validation(format!("Invalid quality value: {}", e))
                })?);
            }
            other => {
                warn!("Ignoring unexpected multipart field: {}", other);
            }
        }
    }

    let file = file.ok_or(AppError::MissingFile)?;
    let target_format = target_format
        .ok_or_else(|| AppError::validation("Missing target_format field"))?;

    Ok((
        file,
        ConvertParams {
            target_format,
            quality,
        },
    ))
}
