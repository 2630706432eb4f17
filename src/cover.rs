//! Cover selection and promotion into a parent manifest.
//!
//! A gallery is shown in its parent by a single cover image. The cover is
//! picked from the gallery's own manifest, then *promoted*: a new
//! [`ImageItem`] whose tier URLs carry the gallery's path relative to the
//! parent, so they resolve from the parent page.
//!
//! ```text
//! Paris/index.json      thumbs/cover.jpg
//! 2023/index.json       Paris/thumbs/cover.jpg
//! index.json            2023/Paris/thumbs/cover.jpg
//! ```
//!
//! Absolute URLs are never rewritten, so the placeholder survives any number
//! of promotions unchanged.

use crate::types::{Entry, ImageItem, Manifest, PixelSize, Variants};

/// Site URL of the image shown for a gallery without any entry.
pub const PLACEHOLDER_URL: &str = "/static/images/not_found.png";

/// Edge length of the square placeholder image.
pub const PLACEHOLDER_EDGE: u32 = 225;

/// Pick the cover of a manifest.
///
/// The first image flagged `isCover`; otherwise the first entry, whose own
/// cover stands in when it is a gallery. `None` for an empty manifest.
pub fn select_cover(manifest: &Manifest) -> Option<&ImageItem> {
    manifest
        .images()
        .find(|image| image.is_cover)
        .or_else(|| {
            manifest.entries.first().map(|entry| match entry {
                Entry::Image(image) => image,
                Entry::Gallery(gallery) => &gallery.cover_image,
            })
        })
}

/// Copy of `cover` with every relative tier URL prefixed by `prefix`.
pub fn promote_cover(cover: &ImageItem, prefix: &str) -> ImageItem {
    ImageItem {
        variants: cover.variants.map(|url| prefix_url(prefix, url)),
        ..cover.clone()
    }
}

fn prefix_url(prefix: &str, url: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || url.starts_with('/') {
        url.to_string()
    } else {
        format!("{prefix}/{url}")
    }
}

/// The "not found" image used when a gallery has nothing to show.
pub fn placeholder() -> ImageItem {
    ImageItem {
        file_name: "not_found.png".to_string(),
        src: PLACEHOLDER_URL.to_string(),
        variants: Variants::uniform(PLACEHOLDER_URL),
        capture_timestamp: None,
        location: None,
        title: None,
        description: None,
        caption_html: None,
        display_title: String::new(),
        pixel_size: Some(PixelSize {
            width: PLACEHOLDER_EDGE,
            height: PLACEHOLDER_EDGE,
        }),
        is_cover: false,
    }
}

/// Promoted cover of a child manifest, or the placeholder.
pub fn cover_for_parent(manifest: &Manifest, prefix: &str) -> ImageItem {
    select_cover(manifest)
        .map(|cover| promote_cover(cover, prefix))
        .unwrap_or_else(placeholder)
}
