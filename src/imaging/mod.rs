//! Image processing and embedded metadata, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **EXIF** (date, GPS, orientation) | `kamadak-exif` |
//! | **XMP** (title, description) | custom packet scanner |
//! | **Resize** | Lanczos3, fit inside, never enlarge |
//! | **Keep metadata** | EXIF/XMP APP1 segments copied into the large tier |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Tier planning combining calculations + backend

pub mod backend;
mod calculations;
pub mod exif_reader;
mod jpeg_segments;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod xmp_parser;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use exif_reader::ExifFields;
pub use operations::{GeneratedVariant, create_variants, plan_variants};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
pub use xmp_parser::{XmpData, read_xmp};
