//! Per-image metadata extraction and the image entries built from it.
//!
//! An image's bytes are read once and handed to [`extract`], which never
//! fails. Every field is looked up on its own:
//!
//! | Field | Source |
//! |---|---|
//! | capture time | EXIF `DateTimeOriginal` → `DateTimeDigitized` → `DateTime` |
//! | location | EXIF GPS latitude/longitude with their N/S/E/W references |
//! | title, description | XMP `dc:title`, `dc:description` |
//! | pixel size | image header (format sniffed from the bytes) |
//!
//! Only a missing pixel size is worth reporting: it means the file could not be
//! recognized as an image at all.
//!
//! ## Titles and captions
//!
//! The display title is resolved from two sources, first non-empty wins:
//!
//! ```text
//! display title: resolve(&[xmp_title, "<Gallery Name> - <file stem>"])
//! ```
//!
//! The derived title drops the ` - <stem>` part for a file named `cover.*`, so
//! a gallery cover is simply titled after its gallery.
//!
//! The caption is a small HTML fragment rendered with maud, so the embedded
//! strings are always escaped:
//!
//! ```html
//! <h4>Eiffel</h4><p>From the river</p><p>Taken Jun 15, 2023</p>
//! ```

use chrono::DateTime;
use maud::html;
use std::io::Cursor;
use std::path::Path;

use crate::imaging::{ExifFields, read_xmp};
use crate::naming::{file_stem, format_name};
use crate::outcome::{ErrorKind, ErrorRecord, Outcome};
use crate::types::{ImageItem, Location, PixelSize, Variants};

/// Everything read from one image's bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    pub capture_timestamp: Option<i64>,
    pub location: Option<Location>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub pixel_size: Option<PixelSize>,
}

/// Extract metadata from the bytes of the image at `path`.
///
/// `path` is only used to label the error record of an unreadable header.
pub fn extract(path: &Path, bytes: &[u8]) -> Outcome<EmbeddedMetadata> {
    let exif = ExifFields::read(bytes);
    let xmp = read_xmp(bytes);

    let mut meta = EmbeddedMetadata {
        capture_timestamp: exif.as_ref().and_then(ExifFields::capture_timestamp),
        location: exif.as_ref().and_then(ExifFields::location),
        title: xmp.title,
        description: xmp.description,
        pixel_size: None,
    };

    match pixel_size(bytes) {
        Ok(size) => {
            meta.pixel_size = Some(size);
            Outcome::ok(meta)
        }
        Err(e) => {
            let record = ErrorRecord::new(path, ErrorKind::PixelSize, e);
            tracing::warn!(path = %path.display(), "could not read pixel size: {}", record.message);
            Outcome::with_errors(meta, vec![record])
        }
    }
}

/// Dimensions from the image header, without decoding pixels.
pub fn pixel_size(bytes: &[u8]) -> Result<PixelSize, image::ImageError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(PixelSize { width, height })
}

/// Resolve a field from multiple sources.
///
/// Returns the first non-None, non-blank value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// `<Gallery Name> - <stem>`, or just the gallery name for `cover.*`.
pub fn derived_title(gallery_name: &str, file_name: &str) -> String {
    let gallery = format_name(gallery_name);
    match file_stem(file_name) {
        "cover" => gallery,
        stem => format!("{gallery} - {stem}"),
    }
}

/// `Jun 15, 2023` for a unix timestamp.
pub fn format_capture_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%b %-d, %Y").to_string())
}

/// Pre-rendered caption, or `None` when there is nothing to show.
pub fn caption_html(
    title: Option<&str>,
    description: Option<&str>,
    capture_timestamp: Option<i64>,
    show_created_date: bool,
) -> Option<String> {
    let taken = capture_timestamp
        .filter(|_| show_created_date)
        .and_then(format_capture_date);

    let markup = html! {
        @if let Some(title) = title {
            h4 { (title) }
        }
        @if let Some(description) = description {
            p { (description) }
        }
        @if let Some(taken) = taken {
            p { "Taken " (taken) }
        }
    }
    .into_string();

    (!markup.is_empty()).then_some(markup)
}

/// Whether a file is its gallery's designated cover.
pub fn is_cover(file_name: &str) -> bool {
    file_name.to_lowercase().starts_with("cover")
}

/// Build the manifest entry of one image.
///
/// `folder` is the gallery folder the file belongs to; its name is used for
/// the derived title.
pub fn image_item(
    folder: &Path,
    file_name: &str,
    meta: EmbeddedMetadata,
    show_created_date: bool,
) -> ImageItem {
    let gallery_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let display_title = resolve(&[
        meta.title.as_deref(),
        Some(&derived_title(&gallery_name, file_name)),
    ])
    .unwrap_or_default();

    ImageItem {
        file_name: file_name.to_string(),
        src: folder.join(file_name).to_string_lossy().into_owned(),
        variants: Variants::for_file(file_name),
        caption_html: caption_html(
            meta.title.as_deref(),
            meta.description.as_deref(),
            meta.capture_timestamp,
            show_created_date,
        ),
        capture_timestamp: meta.capture_timestamp,
        location: meta.location,
        title: meta.title,
        description: meta.description,
        display_title,
        pixel_size: meta.pixel_size,
        is_cover: is_cover(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{JpegFixture, plain_jpeg, plain_png};

    // =========================================================================
    // extract()
    // =========================================================================

    #[test]
    fn extract_reads_every_field() {
        let bytes = JpegFixture::new(64, 48)
            .taken("2023:06:15 10:30:00")
            .gps(('N', [48.0, 51.0, 24.0]), ('E', [2.0, 21.0, 0.0]))
            .xmp_fields(Some("Eiffel"), Some("From the river"))
            .build();

        let outcome = extract(Path::new("a.jpg"), &bytes);
        assert!(outcome.errors.is_empty());
        let meta = outcome.value;
        assert_eq!(meta.capture_timestamp, Some(1_686_825_000));
        assert!(meta.location.is_some());
        assert_eq!(meta.title.as_deref(), Some("Eiffel"));
        assert_eq!(meta.description.as_deref(), Some("From the river"));
        assert_eq!(
            meta.pixel_size,
            Some(PixelSize {
                width: 64,
                height: 48
            })
        );
    }

    #[test]
    fn extract_plain_image_has_only_size() {
        let outcome = extract(Path::new("a.png"), &plain_png(10, 20));
        assert!(outcome.errors.is_empty());
        assert_eq!(
            outcome.value,
            EmbeddedMetadata {
                pixel_size: Some(PixelSize {
                    width: 10,
                    height: 20
                }),
                ..EmbeddedMetadata::default()
            }
        );
    }

    #[test]
    fn extract_garbage_records_pixel_size_error() {
        let outcome = extract(Path::new("broken.jpg"), b"definitely not an image");
        assert_eq!(outcome.value, EmbeddedMetadata::default());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::PixelSize);
        assert_eq!(outcome.errors[0].path, Path::new("broken.jpg"));
    }

    #[test]
    fn extract_date_survives_without_gps() {
        let bytes = JpegFixture::new(8, 8).taken("2020:02:29 23:59:59").build();
        let meta = extract(Path::new("a.jpg"), &bytes).value;
        assert!(meta.capture_timestamp.is_some());
        assert_eq!(meta.location, None);
    }

    // =========================================================================
    // resolve()
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_blank() {
        assert_eq!(
            resolve(&[None, Some("  "), Some(" Fallback ")]),
            Some("Fallback".to_string())
        );
        assert_eq!(resolve(&[Some("XMP"), Some("Derived")]), Some("XMP".to_string()));
        assert_eq!(resolve(&[]), None);
    }

    // =========================================================================
    // Titles and captions
    // =========================================================================

    #[test]
    fn derived_title_appends_stem() {
        assert_eq!(derived_title("2023-06_Paris", "a.jpg"), "2023-06 Paris - a");
    }

    #[test]
    fn derived_title_drops_cover_stem() {
        assert_eq!(derived_title("2023-06_Paris", "cover.jpg"), "2023-06 Paris");
        // Only the exact stem is dropped
        assert_eq!(derived_title("pets", "cover2.jpg"), "Pets - cover2");
    }

    #[test]
    fn capture_date_format() {
        assert_eq!(format_capture_date(1_686_825_000).as_deref(), Some("Jun 15, 2023"));
        assert_eq!(format_capture_date(946_684_800).as_deref(), Some("Jan 1, 2000"));
    }

    #[test]
    fn caption_combines_all_parts() {
        assert_eq!(
            caption_html(Some("Eiffel"), Some("From the river"), Some(1_686_825_000), true)
                .as_deref(),
            Some("<h4>Eiffel</h4><p>From the river</p><p>Taken Jun 15, 2023</p>")
        );
    }

    #[test]
    fn caption_escapes_embedded_text() {
        assert_eq!(
            caption_html(Some("<script>"), Some("Fish & Chips"), None, true).as_deref(),
            Some("<h4>&lt;script&gt;</h4><p>Fish &amp; Chips</p>")
        );
    }

    #[test]
    fn caption_date_can_be_hidden() {
        assert_eq!(caption_html(None, None, Some(1_686_825_000), false), None);
        assert_eq!(
            caption_html(None, None, Some(1_686_825_000), true).as_deref(),
            Some("<p>Taken Jun 15, 2023</p>")
        );
    }

    #[test]
    fn is_cover_is_case_insensitive_prefix() {
        assert!(is_cover("cover.jpg"));
        assert!(is_cover("Cover-2.JPG"));
        assert!(!is_cover("a-cover.jpg"));
    }

    // =========================================================================
    // image_item()
    // =========================================================================

    #[test]
    fn image_item_without_metadata() {
        let meta = extract(Path::new("a.jpg"), &plain_jpeg(30, 20)).value;
        let item = image_item(Path::new("/site/gallery/2023-06_Paris"), "a.jpg", meta, true);

        assert_eq!(item.file_name, "a.jpg");
        assert_eq!(item.src, "/site/gallery/2023-06_Paris/a.jpg");
        assert_eq!(item.variants, Variants::for_file("a.jpg"));
        assert_eq!(item.display_title, "2023-06 Paris - a");
        assert_eq!(item.caption_html, None);
        assert!(!item.is_cover);
    }

    #[test]
    fn image_item_prefers_embedded_title() {
        let meta = EmbeddedMetadata {
            title: Some("Eiffel".to_string()),
            ..EmbeddedMetadata::default()
        };
        let item = image_item(Path::new("/g/Paris"), "cover.jpg", meta, true);
        assert_eq!(item.display_title, "Eiffel");
        assert_eq!(item.caption_html.as_deref(), Some("<h4>Eiffel</h4>"));
        assert!(item.is_cover);
    }
}
