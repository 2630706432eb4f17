//! Resize stage: source photos → size tiers in the output tree.
//!
//! Mirrors the source gallery tree into the output, writing three tiers per
//! photo next to each other and copying `gallery.json` overrides along:
//!
//! ```text
//! content/gallery/                    build/gallery/
//! ├── gallery.json                    ├── gallery.json
//! └── 2023-06_Paris/         ──→      └── 2023-06_Paris/
//!     ├── a.jpg                           ├── large/a.jpg     2400px q88, EXIF kept
//!     └── b.png                           ├── medium/a.jpg     800px q88
//!                                         ├── thumbs/a.jpg     200px q80
//!                                         └── ...b.png
//! ```
//!
//! Hidden entries and folders named like a tier are skipped. Images are
//! resized in parallel on the global rayon pool, whose size the CLI bounds by
//! `processing.max_processes`. A photo that fails is recorded and the run
//! goes on.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::VariantsConfig;
use crate::imaging::{GeneratedVariant, ImageBackend, RustBackend, create_variants};
use crate::outcome::{ErrorKind, ErrorRecord, Outcome};
use crate::tags::OVERRIDE_FILE;
use crate::walk::{is_image_name, is_reserved};

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Refusing to clean {output}: it contains the source tree {source_dir}")]
    UnsafeClean { output: PathBuf, source_dir: PathBuf },
}

/// One photo to resize into `gallery_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeJob {
    pub source: PathBuf,
    pub gallery_dir: PathBuf,
}

/// Everything the resize stage will do, before doing any of it.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResizePlan {
    /// Output folders to create, parents first.
    pub galleries: Vec<PathBuf>,
    pub jobs: Vec<ResizeJob>,
    /// `(source, destination)` of each override file.
    pub overrides: Vec<(PathBuf, PathBuf)>,
}

/// Progress reported while resizing, in completion order.
#[derive(Debug, Clone)]
pub enum ResizeEvent {
    ImageResized {
        source: PathBuf,
        variants: Vec<GeneratedVariant>,
    },
    ImageFailed {
        source: PathBuf,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub variants: Vec<GeneratedVariant>,
}

#[derive(Debug, Default)]
pub struct ResizeSummary {
    pub galleries: usize,
    pub images: Vec<ProcessedImage>,
    pub overrides_copied: usize,
}

/// Plan the mirror of `source_root` into `output_root`.
pub fn plan_resize(source_root: &Path, output_root: &Path) -> Result<ResizePlan, ResizeError> {
    let mut plan = ResizePlan::default();
    let walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0
                || !(name.starts_with('.') || (e.file_type().is_dir() && is_reserved(&name)))
        });

    for entry in walker {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        let destination = output_root.join(rel);

        if entry.file_type().is_dir() {
            plan.galleries.push(destination);
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name == OVERRIDE_FILE {
            plan.overrides.push((entry.path().to_path_buf(), destination));
        } else if is_image_name(&name) {
            let gallery_dir = destination
                .parent()
                .map_or_else(|| output_root.to_path_buf(), Path::to_path_buf);
            plan.jobs.push(ResizeJob {
                source: entry.path().to_path_buf(),
                gallery_dir,
            });
        }
    }
    Ok(plan)
}

/// Resize every photo under `source_root` with the production backend.
pub fn resize_tree(
    source_root: &Path,
    output_root: &Path,
    variants: &VariantsConfig,
    progress: Option<Sender<ResizeEvent>>,
) -> Result<Outcome<ResizeSummary>, ResizeError> {
    resize_tree_with_backend(
        &RustBackend::new(),
        source_root,
        output_root,
        variants,
        progress,
    )
}

/// Resize using a specific backend (allows testing with mock).
pub fn resize_tree_with_backend(
    backend: &impl ImageBackend,
    source_root: &Path,
    output_root: &Path,
    variants: &VariantsConfig,
    progress: Option<Sender<ResizeEvent>>,
) -> Result<Outcome<ResizeSummary>, ResizeError> {
    let plan = plan_resize(source_root, output_root)?;
    for dir in &plan.galleries {
        std::fs::create_dir_all(dir)?;
    }
    tracing::info!(
        images = plan.jobs.len(),
        galleries = plan.galleries.len(),
        "resizing {}",
        source_root.display()
    );

    let results: Vec<Result<ProcessedImage, ErrorRecord>> = plan
        .jobs
        .par_iter()
        .map_with(progress, |progress, job| {
            let result = create_variants(backend, &job.source, &job.gallery_dir, variants);
            let event = match &result {
                Ok(generated) => ResizeEvent::ImageResized {
                    source: job.source.clone(),
                    variants: generated.clone(),
                },
                Err(e) => ResizeEvent::ImageFailed {
                    source: job.source.clone(),
                    message: e.to_string(),
                },
            };
            if let Some(tx) = progress {
                tx.send(event).ok();
            }
            result
                .map(|variants| ProcessedImage {
                    source: job.source.clone(),
                    variants,
                })
                .map_err(|e| {
                    tracing::warn!(path = %job.source.display(), "resize failed: {e}");
                    ErrorRecord::new(&job.source, ErrorKind::Resize, e)
                })
        })
        .collect();

    let mut errors = Vec::new();
    let mut summary = ResizeSummary {
        galleries: plan.galleries.len(),
        ..ResizeSummary::default()
    };
    for result in results {
        match result {
            Ok(image) => summary.images.push(image),
            Err(record) => errors.push(record),
        }
    }

    for (from, to) in &plan.overrides {
        match std::fs::copy(from, to) {
            Ok(_) => summary.overrides_copied += 1,
            Err(e) => {
                tracing::warn!(path = %from.display(), "copy failed: {e}");
                errors.push(ErrorRecord::new(from, ErrorKind::Copy, e));
            }
        }
    }

    Ok(Outcome::with_errors(summary, errors))
}

/// Delete the output tree before a full build.
///
/// Refuses when `output` is `source` or one of its ancestors. Returns whether
/// anything was removed.
pub fn clean_output(output: &Path, source: &Path) -> Result<bool, ResizeError> {
    let Ok(output_abs) = output.canonicalize() else {
        return Ok(false);
    };
    let source_abs = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());
    if source_abs.starts_with(&output_abs) {
        return Err(ResizeError::UnsafeClean {
            output: output.to_path_buf(),
            source_dir: source.to_path_buf(),
        });
    }
    tracing::info!(path = %output.display(), "cleaning output");
    std::fs::remove_dir_all(output)?;
    Ok(true)
}
