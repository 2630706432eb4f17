//! Manifest data model shared by every stage.
//!
//! These types are serialized into each gallery folder's `index.json` by the
//! manifest builder and read back by the page generator. Field names are
//! camelCase on the wire because the generated pages' scripts consume the same
//! documents.
//!
//! ```text
//! [
//!   { "type": "gallery", "title": "Paris", "urlPath": "2023-06_Paris", "coverImage": { ... } },
//!   { "type": "image", "fileName": "a.jpg", "variants": { "thumb": "thumbs/a.jpg", ... } }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Size tier of a derived image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Thumb,
    Medium,
    Large,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Large, Tier::Medium, Tier::Thumb];

    /// Folder name holding this tier's files, next to the gallery's manifest.
    pub fn folder_name(self) -> &'static str {
        match self {
            Tier::Thumb => "thumbs",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

/// Relative URLs of the three size tiers of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variants {
    pub thumb: String,
    pub medium: String,
    pub large: String,
}

impl Variants {
    /// Standard layout: `<tier folder>/<file name>`.
    pub fn for_file(file_name: &str) -> Self {
        Self {
            thumb: format!("{}/{file_name}", Tier::Thumb.folder_name()),
            medium: format!("{}/{file_name}", Tier::Medium.folder_name()),
            large: format!("{}/{file_name}", Tier::Large.folder_name()),
        }
    }

    /// Same URL for every tier (used by the placeholder image).
    pub fn uniform(url: &str) -> Self {
        Self {
            thumb: url.to_string(),
            medium: url.to_string(),
            large: url.to_string(),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Thumb => &self.thumb,
            Tier::Medium => &self.medium,
            Tier::Large => &self.large,
        }
    }

    /// Apply `f` to every tier URL, producing a new value.
    pub fn map(&self, f: impl Fn(&str) -> String) -> Self {
        Self {
            thumb: f(&self.thumb),
            medium: f(&self.medium),
            large: f(&self.large),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// One photo in a gallery manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub file_name: String,
    /// Gallery folder joined with the file name. The placeholder uses its URL.
    pub src: String,
    pub variants: Variants,
    /// Unix seconds of the embedded capture date, read as UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_html: Option<String>,
    pub display_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<PixelSize>,
    pub is_cover: bool,
}

/// A subfolder shown as a single tile in its parent's manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    /// Cover with URLs relative to the parent manifest.
    pub cover_image: ImageItem,
    pub title: String,
    pub folder_path: PathBuf,
    pub url_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Gallery(GalleryItem),
    Image(ImageItem),
}

impl Entry {
    pub fn as_image(&self) -> Option<&ImageItem> {
        match self {
            Entry::Image(image) => Some(image),
            Entry::Gallery(_) => None,
        }
    }

    pub fn as_gallery(&self) -> Option<&GalleryItem> {
        match self {
            Entry::Gallery(gallery) => Some(gallery),
            Entry::Image(_) => None,
        }
    }
}

/// Ordered contents of one gallery folder: galleries first, then images by
/// capture date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<Entry>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageItem> {
        self.entries.iter().filter_map(Entry::as_image)
    }

    pub fn galleries(&self) -> impl Iterator<Item = &GalleryItem> {
        self.entries.iter().filter_map(Entry::as_gallery)
    }
}
