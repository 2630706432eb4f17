//! CLI output formatting for all pipeline stages.
//!
//! Output is **information-centric**: every gallery leads with its positional
//! index and formatted title, with paths shown as secondary context. Paths are
//! printed relative to the root of the stage that produced them.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! 2023-06_Paris/a.jpg
//!     large: 2400x1600
//!     medium: 800x533
//!     thumbs: 200x133
//! Resized 12 images in 3 galleries, copied 2 gallery.json
//! ```
//!
//! ## Manifest
//!
//! ```text
//! Gallery (1 gallery)
//!     001 2023-06 Paris (2 photos)
//!         Source: 2023-06_Paris/
//! ```
//!
//! ## Errors
//!
//! ```text
//! 2 errors occurred
//!     gallery/Paris/large/x.jpg: failed to fill whole buffer (unreadable image)
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::generate::RenderSummary;
use crate::manifest::GalleryNode;
use crate::naming::format_name;
use crate::outcome::ErrorRecord;
use crate::process::{ResizeEvent, ResizeSummary};
use crate::tags::TagIndex;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root`, or unchanged when outside it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Counts shown after a gallery title, e.g. `(2 galleries, 5 photos)`.
fn gallery_counts(node: &GalleryNode) -> String {
    let galleries = node.manifest.galleries().count();
    let photos = node.manifest.images().count();
    let mut parts = Vec::new();
    if galleries > 0 {
        parts.push(plural(galleries, "gallery", "galleries"));
    }
    if photos > 0 {
        parts.push(plural(photos, "photo", "photos"));
    }
    if parts.is_empty() {
        "(empty)".to_string()
    } else {
        format!("({})", parts.join(", "))
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Format a single resize progress event.
pub fn format_resize_event(event: &ResizeEvent, source_root: &Path) -> Vec<String> {
    match event {
        ResizeEvent::ImageResized { source, variants } => {
            let mut lines = vec![relative(source, source_root)];
            for variant in variants {
                lines.push(format!(
                    "    {}: {}x{}",
                    variant.tier.folder_name(),
                    variant.dimensions.width,
                    variant.dimensions.height
                ));
            }
            lines
        }
        ResizeEvent::ImageFailed { source, message } => {
            vec![
                relative(source, source_root),
                format!("    failed: {message}"),
            ]
        }
    }
}

pub fn format_resize_summary(summary: &ResizeSummary) -> Vec<String> {
    vec![format!(
        "Resized {} in {}, copied {} gallery.json",
        plural(summary.images.len(), "image", "images"),
        plural(summary.galleries, "gallery", "galleries"),
        summary.overrides_copied
    )]
}

pub fn print_resize_summary(summary: &ResizeSummary) {
    for line in format_resize_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Manifests
// ============================================================================

/// Format the built gallery tree.
///
/// The top-level gallery is the header; every subgallery is numbered among
/// its siblings, in manifest order.
pub fn format_manifest_tree(tree: &GalleryNode) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_name(&tree.name), gallery_counts(tree))];
    format_children(tree, &tree.path, 1, &mut lines);
    lines
}

fn format_children(node: &GalleryNode, root: &Path, depth: usize, lines: &mut Vec<String>) {
    for (i, child) in node.children.iter().enumerate() {
        let pad = indent(depth);
        lines.push(format!(
            "{}{} {} {}",
            pad,
            format_index(i + 1),
            format_name(&child.name),
            gallery_counts(child)
        ));
        lines.push(format!("{}    Source: {}/", pad, relative(&child.path, root)));
        format_children(child, root, depth + 1, lines);
    }
}

pub fn print_manifest_tree(tree: &GalleryNode) {
    for line in format_manifest_tree(tree) {
        println!("{}", line);
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Format the tag index, one tag per header line with its galleries below.
pub fn format_tag_index(index: &TagIndex, gallery_root: &Path) -> Vec<String> {
    if index.is_empty() {
        return vec!["No tags".to_string()];
    }
    let mut lines = Vec::new();
    for tag in index.tags() {
        let galleries = index.galleries(tag);
        lines.push(format!("{tag} ({})", plural(galleries.len(), "gallery", "galleries")));
        for folder in galleries {
            let rel = relative(folder, gallery_root);
            lines.push(format!("    {}/", rel));
        }
    }
    lines
}

// ============================================================================
// Pages
// ============================================================================

pub fn format_render_summary(summary: &RenderSummary, output_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for page in summary.gallery_pages.iter().chain(&summary.tag_pages) {
        lines.push(format!("\u{2192} {}", relative(page, output_root)));
    }
    lines.push(format!(
        "Generated {}, {}, {}",
        plural(summary.gallery_pages.len(), "page", "pages"),
        plural(summary.tag_pages.len(), "tag page", "tag pages"),
        plural(summary.assets.len(), "asset", "assets")
    ));
    lines
}

pub fn print_render_summary(summary: &RenderSummary, output_root: &Path) {
    for line in format_render_summary(summary, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Final count of recoverable errors, followed by each record.
pub fn format_error_summary(errors: &[ErrorRecord]) -> Vec<String> {
    if errors.is_empty() {
        return vec!["NO errors occurred [ok]".to_string()];
    }
    let mut lines = vec![plural(errors.len(), "error occurred", "errors occurred")];
    lines.extend(errors.iter().map(|record| format!("    {record}")));
    lines
}

pub fn print_error_summary(errors: &[ErrorRecord]) {
    for line in format_error_summary(errors) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
