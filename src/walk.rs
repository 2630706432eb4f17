//! Folder classification for the gallery tree.
//!
//! Every immediate entry of a gallery folder falls into exactly one bucket:
//!
//! | Entry | Kind |
//! |---|---|
//! | `large/`, `medium/`, `thumbs/` | [`EntryKind::Reserved`], never a gallery |
//! | `*.png`, `*.gif`, `*.jpeg`, `*.jpg`, `*.bmp` (any case) | [`EntryKind::Image`] |
//! | any other directory | [`EntryKind::Subfolder`], recursed into |
//! | hidden entries, `index.json`, `gallery.json`, everything else | [`EntryKind::Other`] |
//!
//! Listings come back in gallery order (see [`crate::naming`]).

use std::io;
use std::path::Path;

use crate::naming::sort_entry_names;
use crate::types::Tier;

/// Extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "jpeg", "jpg", "bmp"];

/// Folder holding the images a gallery manifest is built from.
pub const IMAGE_SOURCE_TIER: Tier = Tier::Large;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Reserved,
    Image,
    Subfolder,
    Other,
}

/// Whether `name` is one of the size tier folder names.
pub fn is_reserved(name: &str) -> bool {
    Tier::ALL.iter().any(|tier| tier.folder_name() == name)
}

/// Whether `name` carries an allow-listed image extension.
pub fn is_image_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

pub fn classify(name: &str, is_dir: bool) -> EntryKind {
    if name.starts_with('.') {
        EntryKind::Other
    } else if is_reserved(name) {
        EntryKind::Reserved
    } else if is_dir {
        EntryKind::Subfolder
    } else if is_image_name(name) {
        EntryKind::Image
    } else {
        EntryKind::Other
    }
}

/// Classified contents of one folder, in gallery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub subfolders: Vec<String>,
    pub images: Vec<String>,
}

impl FolderListing {
    /// A leaf gallery has no subfolders other than its tier folders.
    pub fn is_bottom_level(&self) -> bool {
        self.subfolders.is_empty()
    }
}

/// List and classify the immediate entries of `dir`.
pub async fn list_folder(dir: &Path) -> io::Result<FolderListing> {
    let mut listing = FolderListing::default();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await?.is_dir();
        match classify(&name, is_dir) {
            EntryKind::Subfolder => listing.subfolders.push(name),
            EntryKind::Image => listing.images.push(name),
            EntryKind::Reserved | EntryKind::Other => {}
        }
    }
    sort_entry_names(&mut listing.subfolders);
    sort_entry_names(&mut listing.images);
    Ok(listing)
}

/// Image file names in the `large/` folder of a gallery.
///
/// A missing or unreadable folder means the gallery has no images.
pub async fn list_images(gallery: &Path) -> Vec<String> {
    let dir = gallery.join(IMAGE_SOURCE_TIER.folder_name());
    match list_folder(&dir).await {
        Ok(listing) => listing.images,
        Err(e) => {
            tracing::debug!(path = %dir.display(), "no images: {e}");
            Vec::new()
        }
    }
}
