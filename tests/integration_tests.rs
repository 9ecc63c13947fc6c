//! Integration tests for the Morph file conversion service

use std::env;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use morph::{
    config::Config,
    error::AppError,
    models::{ConvertParams, EffectParams, FileStatus, SourceFile},
    registry::FileRegistry,
    services::image_converter,
    services::text_converter,
};

// Serializes tests that touch process environment variables
static ENV_LOCK: once_cell::sync::Lazy<std::sync::Mutex<()>> =
    once_cell::sync::Lazy::new(|| std::sync::Mutex::new(()));

fn png_file(name: &str, width: u32, height: u32) -> SourceFile {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    SourceFile::new(name.to_string(), out).with_mime_type("image/png".to_string())
}

#[tokio::test]
async fn test_config_loading() {
    let _guard = ENV_LOCK.lock().unwrap();

    // Clean up environment variables from other tests
    env::remove_var("SERVER_HOST");
    env::remove_var("SERVER_PORT");
    env::remove_var("MAX_FILE_SIZE_MB");
    env::remove_var("MAX_CONCURRENT_REQUESTS");

    env::set_var("SERVER_HOST", "127.0.0.1");
    env::set_var("SERVER_PORT", "8080");
    env::set_var("MAX_FILE_SIZE_MB", "5");
    env::set_var("MAX_CONCURRENT_REQUESTS", "50");

    let config = Config::from_env().unwrap();
    assert_eq!(config.server_host, "127.0.0.1");
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.max_file_size_mb, 5);
    assert_eq!(config.max_concurrent_requests, 50);
    assert_eq!(config.gemini_model, "gemini-3-flash-preview");

    // Clean up after test
    env::remove_var("SERVER_HOST");
    env::remove_var("SERVER_PORT");
    env::remove_var("MAX_FILE_SIZE_MB");
    env::remove_var("MAX_CONCURRENT_REQUESTS");
}

#[tokio::test]
async fn test_error_response_format() {
    let error = AppError::InvalidApiKey;

    assert_eq!(error.error_code(), "INVALID_API_KEY");

    use axum::http::StatusCode;
    assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_item_conversion_lifecycle() {
    let registry = FileRegistry::new();
    let id = registry.insert(png_file("photo.png", 10, 10)).await;

    let view = registry.snapshot(id).await.unwrap();
    assert_eq!(view.status, FileStatus::Idle);
    assert_eq!(view.category, "image");
    assert!(view.preview_url.is_some());
    assert!(!view.has_artifact);

    // Operation owns its own copy of the source
    let source = registry.begin(id, FileStatus::Converting).await.unwrap();
    let artifact = image_converter::convert_image(
        &source,
        &ConvertParams {
            target_format: "webp".to_string(),
            quality: None,
        },
    )
    .unwrap();
    registry
        .store_artifact(id, "webp".to_string(), artifact)
        .await;

    let view = registry.snapshot(id).await.unwrap();
    assert_eq!(view.status, FileStatus::Completed);
    assert_eq!(view.output_format.as_deref(), Some("webp"));
    assert!(view.has_artifact);

    let stored = registry.artifact(id).await.unwrap();
    assert_eq!(stored.mime_type, "image/webp");
    assert_eq!(stored.file_name, "processed_photo.webp");
}

#[tokio::test]
async fn test_failed_conversion_marks_error_without_artifact() {
    let registry = FileRegistry::new();
    let broken = SourceFile::new("broken.png".to_string(), vec![1, 2, 3])
        .with_mime_type("image/png".to_string());
    let id = registry.insert(broken).await;

    let source = registry.begin(id, FileStatus::Converting).await.unwrap();
    let err = image_converter::convert_image(
        &source,
        &ConvertParams {
            target_format: "png".to_string(),
            quality: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Decode { .. }));
    registry.mark_error(id).await;

    // No partial output, nothing else touched
    let view = registry.snapshot(id).await.unwrap();
    assert_eq!(view.status, FileStatus::Error);
    assert!(!view.has_artifact);
    assert!(view.ai_insights.is_none());
}

#[tokio::test]
async fn test_delete_race_is_tolerated() {
    let registry = FileRegistry::new();
    let id = registry
        .insert(SourceFile::new("notes.txt".to_string(), b"hello".to_vec()))
        .await;

    let source = registry.begin(id, FileStatus::Converting).await.unwrap();

    // The user deletes the item while the conversion is in flight
    assert!(registry.remove(id).await);

    // The conversion still resolves; its result must be dropped silently
    let artifact = text_converter::convert_text(&source, "json");
    registry.store_artifact(id, "json".to_string(), artifact).await;
    registry.mark_error(id).await;

    assert!(registry.snapshot(id).await.is_none());
    assert!(registry.artifact(id).await.is_none());
    assert_eq!(registry.len().await, 0);
}

#[tokio::test]
async fn test_concurrent_items_do_not_share_state() {
    let registry = FileRegistry::new();
    let a = registry.insert(png_file("a.png", 10, 10)).await;
    let b = registry.insert(png_file("b.png", 20, 20)).await;

    // Both items can be busy at the same time
    let src_a = registry.begin(a, FileStatus::Converting).await.unwrap();
    let src_b = registry.begin(b, FileStatus::Processing).await.unwrap();

    let art_a = image_converter::convert_image(
        &src_a,
        &ConvertParams {
            target_format: "bmp".to_string(),
            quality: None,
        },
    )
    .unwrap();
    let art_b = image_converter::apply_effects(
        &src_b,
        &EffectParams {
            corner_radius_percent: 100,
            enhance: true,
        },
    )
    .unwrap();

    registry.store_artifact(a, "bmp".to_string(), art_a).await;
    registry.store_artifact(b, "png".to_string(), art_b).await;

    let view_a = registry.snapshot(a).await.unwrap();
    let view_b = registry.snapshot(b).await.unwrap();
    assert_eq!(view_a.output_format.as_deref(), Some("bmp"));
    assert_eq!(view_b.output_format.as_deref(), Some("png"));
    assert_eq!(registry.artifact(a).await.unwrap().mime_type, "image/bmp");
    assert_eq!(registry.artifact(b).await.unwrap().mime_type, "image/png");
}

#[tokio::test]
async fn test_removed_preview_resource_is_released() {
    let registry = FileRegistry::new();
    let id = registry.insert(png_file("photo.png", 4, 4)).await;

    assert!(registry.source(id).await.is_some());
    assert!(registry.remove(id).await);
    assert!(registry.source(id).await.is_none());

    // A second delete of the same id is a no-op, not an error
    assert!(!registry.remove(id).await);
}

#[tokio::test]
async fn test_concurrent_request_limits() {
    let _guard = ENV_LOCK.lock().unwrap();

    env::remove_var("MAX_CONCURRENT_REQUESTS");
    env::set_var("MAX_CONCURRENT_REQUESTS", "5");

    let config = Config::from_env().unwrap();
    assert_eq!(config.max_concurrent_requests, 5);

    let semaphore = tokio::sync::Semaphore::new(config.max_concurrent_requests);
    assert_eq!(semaphore.available_permits(), 5);

    env::remove_var("MAX_CONCURRENT_REQUESTS");
}
