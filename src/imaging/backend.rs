//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two operations the resize stage
//! needs: identify and resize. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the
//! recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions, after EXIF orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared across the rayon pool.
pub trait ImageBackend: Sync {
    /// Displayed dimensions of the image at `path`.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Write one size tier and return its dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError>;
}
