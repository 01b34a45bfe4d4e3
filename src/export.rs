use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, SecondsFormat, Utc};
use image::ImageEncoder as _;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{BoothError, BoothResult},
    surface::Surface,
};

/// Quality used when the caller passes NaN.
pub const DEFAULT_QUALITY: f32 = 0.92;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Png, Self::Jpeg, Self::Webp];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// PNG when any pixel is not fully opaque, WEBP otherwise.
    pub fn optimal_for(surface: &Surface) -> Self {
        let translucent = surface.data().chunks_exact(4).any(|px| px[3] != 255);
        if translucent { Self::Png } else { Self::Webp }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("image/").unwrap_or(&lower);
        match name {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            _ => Err(BoothError::encode(format!(
                "unknown export format '{s}' (expected png, jpeg or webp)"
            ))),
        }
    }
}

/// Maps a `[0, 1]` quality to the JPEG encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_nan() { DEFAULT_QUALITY } else { quality };
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes `surface`. `quality` only affects JPEG; WEBP is lossless.
#[tracing::instrument(skip(surface), fields(width = surface.width(), height = surface.height()))]
pub fn encode(surface: &Surface, format: ExportFormat, quality: f32) -> BoothResult<Vec<u8>> {
    if surface.is_empty() {
        return Err(BoothError::encode(format!(
            "cannot encode a {}x{} surface",
            surface.width(),
            surface.height()
        )));
    }

    let mut buf = Vec::new();
    let cursor = Cursor::new(&mut buf);
    let (w, h) = (surface.width(), surface.height());
    let result = match format {
        ExportFormat::Png => {
            let rgba = surface.to_rgba_image()?;
            image::codecs::png::PngEncoder::new(cursor).write_image(
                rgba.as_raw(),
                w,
                h,
                image::ExtendedColorType::Rgba8,
            )
        }
        ExportFormat::Jpeg => {
            // Premultiplied color is the pixel composited over black.
            let rgb: Vec<u8> = surface
                .data()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(cursor, jpeg_quality(quality))
                .write_image(&rgb, w, h, image::ExtendedColorType::Rgb8)
        }
        ExportFormat::Webp => {
            let rgba = surface.to_rgba_image()?;
            image::codecs::webp::WebPEncoder::new_lossless(cursor).write_image(
                rgba.as_raw(),
                w,
                h,
                image::ExtendedColorType::Rgba8,
            )
        }
    };
    result.map_err(|e| BoothError::encode(format!("{format}: {e}")))?;
    tracing::debug!(bytes = buf.len(), "encoded");
    Ok(buf)
}

/// `<prefix>-<ISO 8601 timestamp>.<ext>` with `:` and `.` replaced by `-`,
/// e.g. `photo-booth-2024-01-15T10-30-45-123Z.png`.
pub fn file_name(prefix: &str, format: ExportFormat, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{prefix}-{stamp}.{}", format.extension())
}

pub fn file_name_now(prefix: &str, format: ExportFormat) -> String {
    file_name(prefix, format, Utc::now())
}

/// Replaces everything outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes `bytes` to `dir/name` (name sanitized), creating `dir` if needed.
pub async fn save(bytes: &[u8], dir: &Path, name: &str) -> BoothResult<PathBuf> {
    let name = sanitize_file_name(name);
    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(BoothError::validation("export file name is empty"));
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| BoothError::encode(format!("create {}: {e}", dir.display())))?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| BoothError::encode(format!("write {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = bytes.len(), "saved");
    Ok(path)
}

/// Aspect-preserving downscale so the surface fits in `max_w x max_h`.
/// Never upscales.
pub fn fit_within(surface: &Surface, max_w: u32, max_h: u32) -> BoothResult<Surface> {
    if max_w == 0 || max_h == 0 {
        return Err(BoothError::validation("fit bounds must be non-zero"));
    }
    let (w, h) = (surface.width(), surface.height());
    if surface.is_empty() || (w <= max_w && h <= max_h) {
        return Ok(surface.clone());
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let new_w = ((f64::from(w) * scale).round() as u32).clamp(1, max_w);
    let new_h = ((f64::from(h) * scale).round() as u32).clamp(1, max_h);

    let src = image::RgbaImage::from_raw(w, h, surface.data().to_vec())
        .ok_or_else(|| BoothError::validation("surface buffer does not match its size"))?;
    let resized =
        image::imageops::resize(&src, new_w, new_h, image::imageops::FilterType::Triangle);
    Surface::from_premul(new_w, new_h, resized.into_raw())
}
