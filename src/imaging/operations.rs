//! High-level image operations.
//!
//! Turns one source photo into its three size tiers. Planning is pure; the
//! backend only sees fully-resolved [`ResizeParams`].

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Quality, ResizeParams};
use crate::config::VariantsConfig;
use crate::types::Tier;
use std::path::{Path, PathBuf};

/// One tier written for a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub tier: Tier,
    pub path: PathBuf,
    pub dimensions: Dimensions,
}

/// Plan every tier of `source` into `gallery_dir/<tier folder>/<file name>`.
///
/// Ordered largest first.
pub fn plan_variants(
    source: &Path,
    gallery_dir: &Path,
    variants: &VariantsConfig,
) -> Vec<(Tier, ResizeParams)> {
    let file_name = source.file_name().unwrap_or_default();
    Tier::ALL
        .into_iter()
        .map(|tier| {
            let settings = variants.get(tier);
            let params = ResizeParams {
                source: source.to_path_buf(),
                output: gallery_dir.join(tier.folder_name()).join(file_name),
                max_edge: settings.width,
                quality: Quality::new(settings.quality),
                // Manifests read capture data from the large files.
                keep_metadata: tier == Tier::Large,
            };
            (tier, params)
        })
        .collect()
}

/// Produce all tiers of one image. Stops at the first failing tier.
pub fn create_variants(
    backend: &impl ImageBackend,
    source: &Path,
    gallery_dir: &Path,
    variants: &VariantsConfig,
) -> Result<Vec<GeneratedVariant>, BackendError> {
    plan_variants(source, gallery_dir, variants)
        .into_iter()
        .map(|(tier, params)| -> Result<GeneratedVariant, BackendError> {
            if let Some(parent) = params.output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let dimensions = backend.resize(&params)?;
            Ok(GeneratedVariant {
                tier,
                path: params.output,
                dimensions,
            })
        })
        .collect()
}
