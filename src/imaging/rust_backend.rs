//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Orientation | `kamadak-exif` tag 0x0112, applied with `rotate*` / `flip*` |
//! | Resize | `DynamicImage::resize` with `Lanczos3` |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` at the tier quality |
//! | Encode PNG / GIF / BMP | `DynamicImage::write_to` (lossless, quality ignored) |
//! | Keep EXIF / XMP | APP1 segments spliced back in by `jpeg_segments` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, needs_resize, oriented_dimensions};
use super::exif_reader::ExifFields;
use super::jpeg_segments::carry_metadata;
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
#[derive(Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, BackendError> {
    std::fs::read(path).map_err(BackendError::Io)
}

fn orientation_of(bytes: &[u8]) -> u16 {
    ExifFields::read(bytes)
        .and_then(|f| f.orientation())
        .unwrap_or(1)
}

fn decode(bytes: &[u8], path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Rotate/flip pixels so the image displays upright without EXIF help.
fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "gif" => Ok(ImageFormat::Gif),
        "bmp" => Ok(ImageFormat::Bmp),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?,
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, format)?,
        _ => img.write_to(&mut buf, format)?,
    }
    Ok(buf.into_inner())
}

fn save_image(
    img: &DynamicImage,
    path: &Path,
    quality: u8,
    carry_from: Option<&[u8]>,
) -> Result<(), BackendError> {
    let format = output_format(path)?;
    let encoded = encode(img, format, quality).map_err(|e| {
        BackendError::ProcessingFailed(format!("Encode {} failed: {}", path.display(), e))
    })?;
    let bytes = match carry_from {
        Some(source) if format == ImageFormat::Jpeg => carry_metadata(source, encoded),
        _ => encoded,
    };
    std::fs::write(path, bytes).map_err(BackendError::Io)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let bytes = read_bytes(path)?;
        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        let (width, height) = oriented_dimensions((width, height), orientation_of(&bytes));
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError> {
        let bytes = read_bytes(&params.source)?;
        let img = apply_orientation(decode(&bytes, &params.source)?, orientation_of(&bytes));

        let source = (img.width(), img.height());
        let img = if needs_resize(source, params.max_edge) {
            let (w, h) = fit_within(source, params.max_edge);
            img.resize(w, h, FilterType::Lanczos3)
        } else {
            img
        };

        let carry_from = params.keep_metadata.then_some(bytes.as_slice());
        save_image(&img, &params.output, params.quality.value(), carry_from)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }
}
