use std::io::Cursor;
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat as BackendFormat, RgbaImage};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::{ConversionResult, ConvertParams, EffectParams, SourceFile};

/// Quality presets surfaced through the formats endpoint. Any value in
/// [0, 1] is accepted; these are the discrete options clients offer.
pub const QUALITY_PRESETS: [f32; 3] = [0.75, 0.92, 1.0];

pub const DEFAULT_QUALITY: f32 = 0.92;

/// Prefix for synthesized download names: `processed_<base>.<ext>`.
pub const OUTPUT_NAME_PREFIX: &str = "processed";

/// Fixed tone adjustment applied by the "enhance" effect. A single
/// deterministic preset; channels are adjusted in declaration order
/// (contrast, then saturation, then brightness), alpha untouched.
#[derive(Debug, Clone, Copy)]
pub struct TonePreset {
    pub contrast: f32,
    pub saturation: f32,
    pub brightness: f32,
}

pub const ENHANCE_PRESET: TonePreset = TonePreset {
    contrast: 1.10,
    saturation: 1.10,
    brightness: 1.05,
};

/// Supported raster output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Ico,
}

impl OutputFormat {
    /// Parses a target format name. The common three-letter alias "jpg"
    /// folds to "jpeg"; any other unknown name is an encode error, never
    /// a silent fallback.
    pub fn parse(name: &str) -> AppResult<Self> {
        let lower = name.to_ascii_lowercase();
        let canonical = if lower == "jpg" { "jpeg" } else { lower.as_str() };
        match canonical {
            "png" => Ok(OutputFormat::Png),
            "jpeg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "bmp" => Ok(OutputFormat::Bmp),
            "ico" => Ok(OutputFormat::Ico),
            _ => Err(AppError::encode(format!(
                "unsupported target format: {}",
                name
            ))),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Ico => "image/x-icon",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Ico => "ico",
        }
    }

    /// Only JPEG honors the quality parameter with this backend; the
    /// WebP encoder is lossless.
    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }

    fn backend(&self) -> BackendFormat {
        match self {
            OutputFormat::Png => BackendFormat::Png,
            OutputFormat::Jpeg => BackendFormat::Jpeg,
            OutputFormat::Webp => BackendFormat::WebP,
            OutputFormat::Bmp => BackendFormat::Bmp,
            OutputFormat::Ico => BackendFormat::Ico,
        }
    }

    pub fn names() -> Vec<String> {
        ["png", "jpeg", "webp", "bmp", "ico"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Re-encodes a source image into the requested format at the given
/// quality. The surface keeps the image's natural dimensions; the result
/// is all-or-nothing.
pub fn convert_image(file: &SourceFile, params: &ConvertParams) -> AppResult<ConversionResult> {
    let start = Instant::now();
    let format = OutputFormat::parse(&params.target_format)?;
    let quality = params.quality.unwrap_or(DEFAULT_QUALITY);

    let img = image::load_from_memory(&file.content)
        .map_err(|e| AppError::decode(format!("cannot decode \"{}\": {}", file.name, e)))?;
    let (width, height) = img.dimensions();

    debug!(
        file_name = %file.name,
        width,
        height,
        target = format.extension(),
        quality,
        "Decoded image for conversion"
    );

    let mut out = Vec::new();
    encode_surface(&img, format, quality, &mut out)?;

    info!(
        file_name = %file.name,
        target = format.extension(),
        output_bytes = out.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Image conversion completed"
    );

    Ok(ConversionResult::new(
        out,
        format.mime_type(),
        output_file_name(file, format.extension()),
    ))
}

/// Applies the effect pipeline: optional tone enhancement, optional
/// rounded-corner clip, then a fixed PNG encode. PNG is not selectable
/// because it is the only supported output that keeps the alpha the clip
/// introduces.
pub fn apply_effects(file: &SourceFile, params: &EffectParams) -> AppResult<ConversionResult> {
    let start = Instant::now();

    let img = image::load_from_memory(&file.content)
        .map_err(|e| AppError::decode(format!("cannot decode \"{}\": {}", file.name, e)))?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::surface(format!(
            "cannot acquire a {}x{} drawing surface",
            width, height
        )));
    }

    // Filter state is applied before the clip discards pixels, mirroring
    // a draw onto a filtered, clipped surface.
    let mut surface = img.to_rgba8();
    if params.enhance {
        apply_tone_preset(&mut surface, &ENHANCE_PRESET);
    }
    if params.corner_radius_percent > 0 {
        let radius = corner_radius_px(width, height, params.corner_radius_percent);
        clip_rounded_corners(&mut surface, radius);
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(surface)
        .write_to(&mut Cursor::new(&mut out), BackendFormat::Png)
        .map_err(|e| AppError::encode(format!("PNG encoding failed: {}", e)))?;

    info!(
        file_name = %file.name,
        corner_radius_percent = params.corner_radius_percent,
        enhance = params.enhance,
        output_bytes = out.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Effect processing completed"
    );

    Ok(ConversionResult::new(
        out,
        OutputFormat::Png.mime_type(),
        output_file_name(file, OutputFormat::Png.extension()),
    ))
}

/// Absolute clip radius in pixels for a percentage of the shorter
/// dimension: percent/100 x min(w, h)/2. At 100 a square input gets a
/// fully circular mask.
pub fn corner_radius_px(width: u32, height: u32, percent: u8) -> f32 {
    (percent as f32 / 100.0) * (width.min(height) as f32 / 2.0)
}

pub fn output_file_name(file: &SourceFile, extension: &str) -> String {
    format!("{}_{}.{}", OUTPUT_NAME_PREFIX, file.base_name(), extension)
}

fn encode_surface(
    img: &DynamicImage,
    format: OutputFormat,
    quality: f32,
    out: &mut Vec<u8>,
) -> AppResult<()> {
    let mut cursor = Cursor::new(out);
    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG carries no alpha channel and is the only lossy target.
            let q = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut cursor, q);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut cursor, BackendFormat::Png),
        // Normalize to 8-bit RGBA for encoders with narrow color support.
        other => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut cursor, other.backend()),
    };
    result.map_err(|e| {
        AppError::encode(format!(
            "encoding to {} failed: {}",
            format.extension(),
            e
        ))
    })
}

fn apply_tone_preset(surface: &mut RgbaImage, preset: &TonePreset) {
    for pixel in surface.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mut rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];

        for c in rgb.iter_mut() {
            *c = (*c - 0.5) * preset.contrast + 0.5;
        }

        let luma = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
        for c in rgb.iter_mut() {
            *c = luma + (*c - luma) * preset.saturation;
        }

        for c in rgb.iter_mut() {
            *c *= preset.brightness;
        }

        pixel.0 = [
            (rgb[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (rgb[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (rgb[2].clamp(0.0, 1.0) * 255.0).round() as u8,
            a,
        ];
    }
}

/// Zeroes the alpha of every pixel outside a rounded rectangle covering
/// the whole surface, with one pixel of edge coverage smoothing.
fn clip_rounded_corners(surface: &mut RgbaImage, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let r = radius.min(width / 2.0).min(height / 2.0);

    for (x, y, pixel) in surface.enumerate_pixels_mut() {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;

        // Only pixels inside one of the four corner squares can fall
        // outside the rounded rectangle.
        let in_left = px < r;
        let in_right = px > width - r;
        let in_top = py < r;
        let in_bottom = py > height - r;
        if !(in_left || in_right) || !(in_top || in_bottom) {
            continue;
        }

        let cx = if in_left { r } else { width - r };
        let cy = if in_top { r } else { height - r };
        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        let coverage = (r - dist + 0.5).clamp(0.0, 1.0);
        if coverage < 1.0 {
            pixel.0[3] = (pixel.0[3] as f32 * coverage).round() as u8;
        }
    }
}
