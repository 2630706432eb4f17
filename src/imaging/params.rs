//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They sit between
//! [`operations`](super::operations), which decides which tiers an image needs,
//! and the [`backend`](super::backend), which does the pixel work.

use std::path::PathBuf;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(88)
    }
}

/// Produce one size tier of one image.
///
/// The output is fit inside a `max_edge`×`max_edge` box, keeping the aspect
/// ratio and never enlarging. The output format follows the extension of
/// `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_edge: u32,
    pub quality: Quality,
    /// Copy EXIF and XMP from a JPEG source into a JPEG output.
    pub keep_metadata: bool,
}
