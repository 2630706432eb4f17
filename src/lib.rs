//! # Gallery Forge
//!
//! A static photo gallery generator. The folder tree is the data source:
//! every folder under the top-level gallery folder becomes a gallery, photos
//! are described by their embedded EXIF/XMP metadata, and a hand-written
//! `gallery.json` may tag a gallery.
//!
//! # Architecture: Three Stages
//!
//! ```text
//! 1. Resize    content/gallery/  →  build/gallery/**/{large,medium,thumbs}/
//! 2. Manifest  build/gallery/    →  build/gallery/**/index.json
//! 3. Render    manifests + tags  →  build/**/index.html, tag pages, assets
//! ```
//!
//! Manifests are built from the resized output tree, reading each photo from
//! its `large/` tier, which keeps the embedded metadata of the original. A
//! folder's manifest lists its subgalleries first, each shown by a cover
//! picked from the subgallery's own manifest and *promoted* so its URLs
//! resolve from the parent folder.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Stage 1, mirrors the source tree into size tiers on a rayon pool |
//! | [`manifest`] | Stage 2, recursive async manifest builder |
//! | [`generate`] | Stage 3, renders pages, tag pages and assets using Maud |
//! | [`walk`] | Folder listing and entry classification (reserved tiers, images) |
//! | [`metadata`] | Per-image metadata, derived titles and captions |
//! | [`cover`] | Cover selection and URL promotion into a parent manifest |
//! | [`tags`] | `gallery.json` overrides and the tag index |
//! | [`naming`] | Dated folder ordering and display names |
//! | [`imaging`] | Pure-Rust resizing, EXIF and XMP reading |
//! | [`types`] | Manifest data model written to `index.json` |
//! | [`outcome`] | Recoverable error records carried next to results |
//! | [`config`] | `config.toml` loading, merging over defaults, validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting of every stage |
//!
//! # Error Handling
//!
//! A failure on a path the run cannot do without (the top-level folder, a
//! manifest write at the root) is a stage error type and stops the run.
//! Anything narrower, a single unreadable photo or a malformed `gallery.json`,
//! becomes an [`outcome::ErrorRecord`]. Stages return what they could build
//! together with their records; the CLI prints the total at the end.

pub mod config;
pub mod cover;
pub mod generate;
pub mod imaging;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod outcome;
pub mod output;
pub mod process;
pub mod tags;
pub mod types;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
