//! Unit tests for individual components

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use morph::{
    error::AppError,
    models::{ConvertParams, EffectParams, FileStatus, SourceFile},
    services::gemini::{
        is_supported_language, truncate_for_translation, LANGUAGES, MAX_TRANSLATION_CHARS,
        TRUNCATION_MARKER,
    },
    services::image_converter::{
        apply_effects, convert_image, corner_radius_px, output_file_name, OutputFormat,
        QUALITY_PRESETS,
    },
    services::text_converter::{convert_text, is_document_target, DOCUMENT_TARGETS},
};

fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, color);
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn image_file(name: &str, width: u32, height: u32, color: Rgba<u8>) -> SourceFile {
    SourceFile::new(name.to_string(), png_bytes(width, height, color))
        .with_mime_type("image/png".to_string())
}

fn text_file(name: &str, content: &str) -> SourceFile {
    SourceFile::new(name.to_string(), content.as_bytes().to_vec())
        .with_mime_type("text/plain".to_string())
}

fn convert(file: &SourceFile, target: &str, quality: Option<f32>) -> morph::models::ConversionResult {
    convert_image(
        file,
        &ConvertParams {
            target_format: target.to_string(),
            quality,
        },
    )
    .unwrap()
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::InvalidApiKey.error_code(), "INVALID_API_KEY");
    assert_eq!(AppError::RateLimitExceeded.error_code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(
        AppError::FileTooLarge { size: 20, limit: 10 }.error_code(),
        "FILE_TOO_LARGE"
    );
    assert_eq!(AppError::decode("bad").error_code(), "DECODE_ERROR");
    assert_eq!(AppError::encode("bad").error_code(), "ENCODE_ERROR");
    assert_eq!(AppError::surface("bad").error_code(), "SURFACE_ERROR");
    assert_eq!(AppError::ai_request("bad").error_code(), "AI_REQUEST_ERROR");
    assert_eq!(AppError::validation("bad").error_code(), "VALIDATION_ERROR");
}

#[test]
fn test_error_status_codes() {
    use axum::http::StatusCode;

    assert_eq!(AppError::InvalidApiKey.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::decode("bad").status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::encode("bad").status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::ItemBusy { status: FileStatus::Converting }.status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_format_parsing_and_alias() {
    assert_eq!(OutputFormat::parse("png").unwrap(), OutputFormat::Png);
    assert_eq!(OutputFormat::parse("JPEG").unwrap(), OutputFormat::Jpeg);
    // The three-letter alias folds to the canonical encoder identifier
    assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
    assert_eq!(OutputFormat::parse("ico").unwrap(), OutputFormat::Ico);

    // Anything else is an encode error, never a silent fallback
    for unsupported in ["gif", "tiff", "jp", "jpegg", ""] {
        let err = OutputFormat::parse(unsupported).unwrap_err();
        assert!(matches!(err, AppError::Encode { .. }), "{}", unsupported);
    }
}

#[test]
fn test_conversion_preserves_dimensions_for_all_targets() {
    let file = image_file("photo.png", 10, 10, Rgba([255, 0, 0, 255]));

    for target in ["png", "jpeg", "webp", "bmp", "ico"] {
        let result = convert(&file, target, Some(0.92));
        let decoded = image::load_from_memory(&result.data).unwrap();
        assert_eq!(decoded.dimensions(), (10, 10), "target {}", target);
    }
}

#[test]
fn test_quality_is_a_noop_for_lossless_targets() {
    let file = image_file("photo.png", 16, 8, Rgba([10, 200, 30, 255]));

    for target in ["png", "bmp"] {
        let low = convert(&file, target, Some(0.75));
        let high = convert(&file, target, Some(1.0));
        assert_eq!(low.data, high.data, "target {}", target);
    }
}

#[test]
fn test_jpg_alias_matches_jpeg_output() {
    let file = image_file("photo.png", 12, 12, Rgba([0, 0, 255, 255]));

    let via_alias = convert(&file, "jpg", Some(0.75));
    let canonical = convert(&file, "jpeg", Some(0.75));

    assert_eq!(via_alias.mime_type, "image/jpeg");
    assert_eq!(via_alias.mime_type, canonical.mime_type);
    assert_eq!(via_alias.data, canonical.data);
}

#[test]
fn test_red_square_to_ico() {
    let file = image_file("icon.png", 10, 10, Rgba([255, 0, 0, 255]));

    let result = convert(&file, "ico", None);
    assert_eq!(result.mime_type, "image/x-icon");

    let decoded = image::load_from_memory(&result.data).unwrap();
    assert_eq!(decoded.dimensions(), (10, 10));
}

#[test]
fn test_decode_error_for_garbage_input() {
    let file = SourceFile::new("broken.png".to_string(), vec![0, 1, 2, 3])
        .with_mime_type("image/png".to_string());
    let err = convert_image(
        &file,
        &ConvertParams {
            target_format: "png".to_string(),
            quality: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Decode { .. }));
}

#[test]
fn test_effects_without_radius_or_enhance_is_identity() {
    let file = image_file("photo.png", 9, 7, Rgba([120, 50, 220, 255]));
    let source_pixels = image::load_from_memory(&file.content).unwrap().to_rgba8();

    let result = apply_effects(
        &file,
        &EffectParams {
            corner_radius_percent: 0,
            enhance: false,
        },
    )
    .unwrap();

    assert_eq!(result.mime_type, "image/png");
    let output = image::load_from_memory(&result.data).unwrap().to_rgba8();
    assert_eq!(output, source_pixels);
}

#[test]
fn test_full_radius_clips_square_to_circle() {
    let file = image_file("square.png", 50, 50, Rgba([255, 255, 255, 255]));

    let result = apply_effects(
        &file,
        &EffectParams {
            corner_radius_percent: 100,
            enhance: false,
        },
    )
    .unwrap();

    let output = image::load_from_memory(&result.data).unwrap().to_rgba8();
    // All four corners fall outside the inscribed circle
    assert_eq!(output.get_pixel(0, 0).0[3], 0);
    assert_eq!(output.get_pixel(49, 0).0[3], 0);
    assert_eq!(output.get_pixel(0, 49).0[3], 0);
    assert_eq!(output.get_pixel(49, 49).0[3], 0);
    // The center stays fully opaque
    assert_eq!(output.get_pixel(25, 25).0[3], 255);
    // Edge midpoints lie on the circle and keep near-full coverage
    assert!(output.get_pixel(25, 0).0[3] >= 250);
    assert!(output.get_pixel(0, 25).0[3] >= 250);
}

#[test]
fn test_radius_is_relative_to_the_shorter_dimension() {
    // 50% of min(100, 50)/2 = 12.5 pixels
    assert_eq!(corner_radius_px(100, 50, 50), 12.5);
    assert_eq!(corner_radius_px(50, 50, 100), 25.0);
    assert_eq!(corner_radius_px(640, 480, 0), 0.0);

    let file = image_file("wide.png", 100, 50, Rgba([0, 128, 0, 255]));
    let result = apply_effects(
        &file,
        &EffectParams {
            corner_radius_percent: 50,
            enhance: false,
        },
    )
    .unwrap();

    let output = image::load_from_memory(&result.data).unwrap().to_rgba8();
    // Corners are clipped away...
    assert_eq!(output.get_pixel(0, 0).0[3], 0);
    assert_eq!(output.get_pixel(99, 49).0[3], 0);
    // ...while edge midpoints between the corner bands are untouched
    assert_eq!(output.get_pixel(0, 25).0[3], 255);
    assert_eq!(output.get_pixel(50, 0).0[3], 255);
    assert_eq!(output.get_pixel(50, 25).0[3], 255);
}

#[test]
fn test_enhance_is_deterministic_and_changes_tone() {
    let file = image_file("photo.png", 8, 8, Rgba([100, 150, 200, 255]));
    let params = EffectParams {
        corner_radius_percent: 0,
        enhance: true,
    };

    let first = apply_effects(&file, &params).unwrap();
    let second = apply_effects(&file, &params).unwrap();
    assert_eq!(first.data, second.data);

    let source = image::load_from_memory(&file.content).unwrap().to_rgba8();
    let enhanced = image::load_from_memory(&first.data).unwrap().to_rgba8();
    assert_ne!(source, enhanced);
    // Alpha is never touched by the tone preset
    assert!(enhanced.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_text_passthrough_is_byte_identical() {
    let content = "# Title\n\nSome *markdown* content with \"quotes\".";
    let file = text_file("notes.md", content);

    for target in ["txt", "md", "html", "xml"] {
        let result = convert_text(&file, target);
        assert_eq!(&result.data[..], content.as_bytes(), "target {}", target);
        assert_eq!(result.mime_type, "text/plain");
    }
}

#[test]
fn test_json_target_wraps_content() {
    for content in ["", "plain text", "with \"embedded\" quotes and \\ backslash"] {
        let file = text_file("notes.txt", content);
        let result = convert_text(&file, "json");

        let parsed: serde_json::Value = serde_json::from_slice(&result.data).unwrap();
        assert_eq!(parsed["content"], content, "content {:?}", content);

        // 2-space indentation
        let rendered = String::from_utf8(result.data.to_vec()).unwrap();
        assert!(rendered.starts_with("{\n  \"content\""), "{}", rendered);
    }
}

#[test]
fn test_document_target_list() {
    assert_eq!(DOCUMENT_TARGETS, ["txt", "md", "json", "html", "xml"]);
    assert!(is_document_target("json"));
    assert!(!is_document_target("pdf"));
}

#[test]
fn test_translation_truncation_budget() {
    let at_budget: String = "x".repeat(MAX_TRANSLATION_CHARS);
    assert_eq!(truncate_for_translation(&at_budget), at_budget);

    let below: String = "y".repeat(100);
    assert_eq!(truncate_for_translation(&below), below);

    let oversized: String = "z".repeat(MAX_TRANSLATION_CHARS * 2);
    let truncated = truncate_for_translation(&oversized);
    assert_eq!(
        truncated.chars().count(),
        MAX_TRANSLATION_CHARS + TRUNCATION_MARKER.chars().count()
    );
    assert!(truncated.ends_with(TRUNCATION_MARKER));
    // Deterministic and idempotent for the same oversized input
    assert_eq!(truncate_for_translation(&oversized), truncated);
}

#[test]
fn test_language_table() {
    assert_eq!(LANGUAGES.len(), 8);
    for name in [
        "French", "English", "Spanish", "German", "Chinese", "Japanese", "Italian", "Portuguese",
    ] {
        assert!(is_supported_language(name), "{}", name);
    }
    assert!(!is_supported_language("Latin"));
}

#[test]
fn test_output_file_name_pattern() {
    let file = image_file("vacation.2024.jpg.png", 1, 1, Rgba([0, 0, 0, 255]));
    assert_eq!(output_file_name(&file, "webp"), "processed_vacation.webp");

    let plain = text_file("notes", "x");
    assert_eq!(output_file_name(&plain, "json"), "processed_notes.json");
}

#[test]
fn test_quality_presets() {
    assert_eq!(QUALITY_PRESETS, [0.75, 0.92, 1.0]);
    assert!(OutputFormat::Jpeg.is_lossy());
    assert!(!OutputFormat::Png.is_lossy());
    assert!(!OutputFormat::Bmp.is_lossy());
}

#[test]
fn test_param_validation() {
    let bad_quality = ConvertParams {
        target_format: "jpeg".to_string(),
        quality: Some(1.5),
    };
    assert!(bad_quality.validate().is_err());

    let bad_radius = EffectParams {
        corner_radius_percent: 101,
        enhance: false,
    };
    assert!(bad_radius.validate().is_err());

    let ok = EffectParams {
        corner_radius_percent: 100,
        enhance: true,
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_image_allow_list() {
    let svg = SourceFile::new("logo.svg".to_string(), b"<svg/>".to_vec())
        .with_mime_type("image/svg+xml".to_string());
    assert!(svg.is_image());
    assert!(svg.is_svg());

    let csv = SourceFile::new("data.csv".to_string(), b"a,b".to_vec())
        .with_mime_type("text/csv".to_string());
    assert!(!csv.is_image());
    assert_eq!(csv.category(), "document");

    let unknown = SourceFile::new("blob".to_string(), vec![0u8; 4]);
    assert!(!unknown.is_image());
}
