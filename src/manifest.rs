//! Recursive manifest builder.
//!
//! Builds `index.json` for a gallery folder and everything beneath it. The
//! folder's own images are read from its `large/` tier, so this runs on the
//! resized output tree.
//!
//! ## Order of work
//!
//! A folder's manifest needs its subfolders' manifests (each subfolder tile
//! shows the subfolder's cover), so subfolders are built first. Within one
//! folder the subfolder builds and the per-image metadata extraction are all
//! started together and awaited together:
//!
//! ```text
//! build(Paris/)
//! ├── build(Paris/Louvre/)   ─┐
//! ├── build(Paris/Night/)     ├─ concurrently
//! ├── extract(large/a.jpg)    │
//! └── extract(large/b.jpg)   ─┘
//!     then sort, write Paris/index.json
//! ```
//!
//! Extraction is blocking work (file reads, header parsing) and runs on the
//! runtime's blocking pool. Folders never share mutable state: each call
//! returns its node plus the [`ErrorRecord`]s met below it.
//!
//! ## Entry order
//!
//! Galleries first, in listing order. Then images sorted by capture time
//! with a stable sort: images without a timestamp come first, ties keep
//! listing order.
//!
//! ## Failures
//!
//! A single bad image is recorded and skipped. A subfolder that cannot be
//! listed or whose manifest cannot be written is recorded and left out of its
//! parent. Only a failure at the root itself is returned as a [`BuildError`].

use futures_util::future::{BoxFuture, FutureExt, join_all};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::SiteConfig;
use crate::cover::cover_for_parent;
use crate::metadata::{self, image_item};
use crate::naming::format_name;
use crate::outcome::{ErrorKind, ErrorRecord, Outcome};
use crate::types::{Entry, GalleryItem, ImageItem, Manifest};
use crate::walk::{self, IMAGE_SOURCE_TIER};

/// File name of a folder's manifest.
pub const MANIFEST_FILE: &str = "index.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Settings the builder reads from the site config.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub top_level_name: String,
    pub show_created_date: bool,
}

impl From<&SiteConfig> for BuildOptions {
    fn from(config: &SiteConfig) -> Self {
        Self {
            top_level_name: config.top_level_name.clone(),
            show_created_date: config.show_created_date,
        }
    }
}

/// One built gallery folder and its successfully built subfolders.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryNode {
    pub path: PathBuf,
    /// Folder name as written on disk.
    pub name: String,
    pub is_top_level: bool,
    /// No subfolders besides the tier folders.
    pub is_bottom_level: bool,
    pub manifest: Manifest,
    pub children: Vec<GalleryNode>,
}

impl GalleryNode {
    /// This node followed by all of its descendants, parents first.
    pub fn iter(&self) -> impl Iterator<Item = &GalleryNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Build manifests for `root` and every gallery beneath it.
pub async fn build_manifests(
    root: &Path,
    options: &BuildOptions,
) -> Result<Outcome<GalleryNode>, BuildError> {
    let outcome = build_folder(root.to_path_buf(), true, options).await?;
    tracing::info!(
        path = %root.display(),
        galleries = outcome.value.iter().count(),
        errors = outcome.errors.len(),
        "manifests built"
    );
    Ok(outcome)
}

fn build_folder(
    folder: PathBuf,
    is_root: bool,
    options: &BuildOptions,
) -> BoxFuture<'_, Result<Outcome<GalleryNode>, BuildError>> {
    async move {
        let listing = walk::list_folder(&folder)
            .await
            .map_err(|e| BuildError::io(&folder, e))?;
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_top_level = is_root && name == options.top_level_name;

        let child_builds = listing
            .subfolders
            .iter()
            .map(|child| build_folder(folder.join(child), false, options));
        let image_names = walk::list_images(&folder).await;
        let extractions = image_names
            .iter()
            .map(|file_name| extract_image(&folder, file_name, options.show_created_date));

        let (child_results, image_results) =
            tokio::join!(join_all(child_builds), join_all(extractions));

        let mut errors = Vec::new();
        let mut children = Vec::new();
        let mut entries = Vec::new();

        for (child_name, result) in listing.subfolders.iter().zip(child_results) {
            let child_path = folder.join(child_name);
            match result {
                Ok(outcome) => {
                    let node = outcome.merge_into(&mut errors);
                    let url_path = child_url_path(&options.top_level_name, is_top_level, child_name);
                    entries.push(Entry::Gallery(GalleryItem {
                        cover_image: cover_for_parent(&node.manifest, &url_path),
                        title: format_name(child_name),
                        folder_path: child_path,
                        url_path,
                    }));
                    children.push(node);
                }
                Err(e) => {
                    tracing::warn!(path = %child_path.display(), "gallery left out: {e}");
                    errors.push(ErrorRecord::new(&child_path, ErrorKind::Subtree, e));
                }
            }
        }

        let mut images = Vec::new();
        for result in image_results {
            if let Some(image) = result.merge_into(&mut errors) {
                images.push(image);
            }
        }
        sort_images(&mut images);
        entries.extend(images.into_iter().map(Entry::Image));

        let manifest = Manifest { entries };
        write_manifest(&folder, &manifest).await?;
        tracing::info!(
            path = %folder.display(),
            entries = manifest.len(),
            "wrote {MANIFEST_FILE}"
        );

        Ok(Outcome::with_errors(
            GalleryNode {
                path: folder,
                name,
                is_top_level,
                is_bottom_level: listing.is_bottom_level(),
                manifest,
                children,
            },
            errors,
        ))
    }
    .boxed()
}

/// URL of a child gallery relative to its parent's page.
///
/// The top-level page is written one folder up, at the site root, so its
/// children are reached through the top-level folder name.
pub fn child_url_path(top_level_name: &str, parent_is_top_level: bool, child: &str) -> String {
    if parent_is_top_level {
        format!("{top_level_name}/{child}")
    } else {
        child.to_string()
    }
}

/// Read and describe one image of `folder` on the blocking pool.
async fn extract_image(
    folder: &Path,
    file_name: &str,
    show_created_date: bool,
) -> Outcome<Option<ImageItem>> {
    let folder = folder.to_path_buf();
    let file_name = file_name.to_string();
    let path = folder.join(IMAGE_SOURCE_TIER.folder_name()).join(&file_name);
    let task_path = path.clone();

    let task = tokio::task::spawn_blocking(move || {
        let bytes = match std::fs::read(&task_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %task_path.display(), "unreadable image: {e}");
                return Outcome::with_errors(
                    None,
                    vec![ErrorRecord::new(&task_path, ErrorKind::UnreadableImage, e)],
                );
            }
        };
        tracing::debug!(path = %task_path.display(), "extracting metadata");
        metadata::extract(&task_path, &bytes)
            .map(|meta| Some(image_item(&folder, &file_name, meta, show_created_date)))
    });
    settle_extraction(&path, task.await)
}

/// An extraction task that died is one unreadable image, not a failed folder.
fn settle_extraction(
    path: &Path,
    joined: Result<Outcome<Option<ImageItem>>, tokio::task::JoinError>,
) -> Outcome<Option<ImageItem>> {
    joined.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "metadata task failed: {e}");
        Outcome::with_errors(
            None,
            vec![ErrorRecord::new(path, ErrorKind::UnreadableImage, e)],
        )
    })
}

/// Stable ascending sort by capture time, untimed images first.
pub fn sort_images(images: &mut [ImageItem]) {
    images.sort_by_key(|image| image.capture_timestamp);
}

async fn write_manifest(folder: &Path, manifest: &Manifest) -> Result<(), BuildError> {
    let path = folder.join(MANIFEST_FILE);
    let json = serde_json::to_vec_pretty(manifest).map_err(|source| BuildError::Json {
        path: path.clone(),
        source,
    })?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| BuildError::io(&path, e))
}

/// Read back the manifest written for `folder`.
pub fn load_manifest(folder: &Path) -> Result<Manifest, BuildError> {
    let path = folder.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
    serde_json::from_str(&content).map_err(|source| BuildError::Json { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::{PLACEHOLDER_URL, select_cover};
    use crate::test_helpers::{JpegFixture, entry_labels, find_image, plain_jpeg, write_image};
    use tempfile::TempDir;

    fn options() -> BuildOptions {
        BuildOptions::from(&SiteConfig::default())
    }

    fn dated(date: &str) -> Vec<u8> {
        JpegFixture::new(16, 12).taken(date).build()
    }

    async fn build(root: &Path) -> Outcome<GalleryNode> {
        build_manifests(root, &options()).await.unwrap()
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[tokio::test]
    async fn paris_sorted_by_date_with_flagged_cover() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gallery");
        let paris = root.join("2023-06_Paris");
        write_image(&paris.join("large/cover.jpg"), &dated("2023:06:20 18:00:00"));
        write_image(&paris.join("large/a.jpg"), &dated("2023:06:15 10:30:00"));

        let outcome = build(&root).await;
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);

        let paris_node = &outcome.value.children[0];
        assert_eq!(
            entry_labels(&paris_node.manifest),
            vec!["image:a.jpg", "image:cover.jpg"]
        );
        assert_eq!(
            select_cover(&paris_node.manifest).unwrap().file_name,
            "cover.jpg"
        );

        let on_disk = load_manifest(&paris).unwrap();
        assert_eq!(on_disk, paris_node.manifest);
    }

    #[tokio::test]
    async fn galleries_precede_images() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gallery");
        write_image(&root.join("large/0001.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("zzz/large/z.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("aaa/large/a.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&root).await;
        assert_eq!(
            entry_labels(&outcome.value.manifest),
            vec!["gallery:Aaa", "gallery:Zzz", "image:0001.jpg"]
        );
    }

    #[tokio::test]
    async fn untimed_images_come_first_in_listing_order() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("trip");
        write_image(&folder.join("large/a.jpg"), &dated("2022:01:01 00:00:00"));
        write_image(&folder.join("large/b.jpg"), &plain_jpeg(8, 8));
        write_image(&folder.join("large/c.jpg"), &dated("2021:01:01 00:00:00"));
        write_image(&folder.join("large/d.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&folder).await;
        assert_eq!(
            entry_labels(&outcome.value.manifest),
            vec!["image:b.jpg", "image:d.jpg", "image:c.jpg", "image:a.jpg"]
        );
    }

    #[test]
    fn sort_images_is_stable_for_equal_times() {
        let item = |name: &str, ts: Option<i64>| {
            let meta = metadata::EmbeddedMetadata {
                capture_timestamp: ts,
                ..Default::default()
            };
            image_item(Path::new("g"), name, meta, false)
        };
        let mut images = vec![item("x", Some(5)), item("y", Some(5)), item("z", Some(1))];
        sort_images(&mut images);
        let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["z", "x", "y"]);
    }

    // =========================================================================
    // Covers and url paths
    // =========================================================================

    #[tokio::test]
    async fn nested_cover_accumulates_prefixes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gallery");
        write_image(
            &root.join("2023/Paris/large/cover.jpg"),
            &plain_jpeg(8, 8),
        );

        let outcome = build(&root).await;
        let top = &outcome.value;
        assert!(top.is_top_level);

        let year = top.manifest.galleries().next().unwrap();
        assert_eq!(year.url_path, "gallery/2023");
        assert_eq!(
            year.cover_image.variants.thumb,
            "gallery/2023/Paris/thumbs/cover.jpg"
        );

        let year_manifest = load_manifest(&root.join("2023")).unwrap();
        let paris = year_manifest.galleries().next().unwrap();
        assert_eq!(paris.url_path, "Paris");
        assert_eq!(paris.cover_image.variants.thumb, "Paris/thumbs/cover.jpg");

        // The subgallery's own manifest keeps unprefixed URLs.
        let paris_manifest = load_manifest(&root.join("2023/Paris")).unwrap();
        assert_eq!(
            find_image(&paris_manifest, "cover.jpg").variants.thumb,
            "thumbs/cover.jpg"
        );
    }

    #[tokio::test]
    async fn nested_folder_named_like_top_level_is_not_top_level() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gallery");
        write_image(&root.join("Zoo/large/a.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("Family/gallery/Kids/large/b.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&root).await;
        assert!(outcome.errors.is_empty());
        let top = &outcome.value;
        assert!(top.is_top_level);
        assert_eq!(top.iter().filter(|node| node.is_top_level).count(), 1);

        let nested = top
            .iter()
            .find(|node| node.path == root.join("Family/gallery"))
            .unwrap();
        assert!(!nested.is_top_level);
        let kids = nested.manifest.galleries().next().unwrap();
        assert_eq!(kids.url_path, "Kids");
        assert_eq!(kids.cover_image.variants.thumb, "Kids/thumbs/b.jpg");
    }

    #[tokio::test]
    async fn empty_folder_gets_placeholder_in_parent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("albums");
        std::fs::create_dir_all(root.join("Empty")).unwrap();

        let outcome = build(&root).await;
        let empty = &outcome.value.children[0];
        assert!(empty.manifest.is_empty());
        assert!(empty.is_bottom_level);
        assert_eq!(select_cover(&empty.manifest), None);

        let tile = outcome.value.manifest.galleries().next().unwrap();
        assert_eq!(tile.url_path, "Empty");
        assert_eq!(tile.cover_image.variants.large, PLACEHOLDER_URL);
        assert_eq!(
            std::fs::read_to_string(root.join("Empty/index.json")).unwrap().trim(),
            "[]"
        );
    }

    #[tokio::test]
    async fn reserved_folders_never_become_galleries() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("albums");
        write_image(&root.join("Trip/large/a.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("Trip/medium/a.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("Trip/thumbs/a.jpg"), &plain_jpeg(8, 8));
        write_image(&root.join("Trip/Day/large/thumbs/b.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&root).await;
        for node in outcome.value.iter() {
            for gallery in node.manifest.galleries() {
                let name = gallery.folder_path.file_name().unwrap().to_string_lossy();
                assert!(!walk::is_reserved(&name), "{name} listed as a gallery");
            }
        }
        let trip = &outcome.value.children[0];
        assert!(!trip.is_bottom_level);
        assert_eq!(entry_labels(&trip.manifest), vec!["gallery:Day", "image:a.jpg"]);
        assert!(trip.children[0].is_bottom_level);
    }

    // =========================================================================
    // Image entries
    // =========================================================================

    #[tokio::test]
    async fn image_entries_carry_metadata() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("2023-06_Paris");
        let jpeg = JpegFixture::new(40, 30)
            .taken("2023:06:15 10:30:00")
            .xmp_fields(Some("Eiffel"), Some("From the river"))
            .build();
        write_image(&folder.join("large/a.jpg"), &jpeg);

        let outcome = build(&folder).await;
        let item = find_image(&outcome.value.manifest, "a.jpg");
        assert_eq!(item.capture_timestamp, Some(1_686_825_000));
        assert_eq!(item.display_title, "Eiffel");
        assert_eq!(item.src, folder.join("a.jpg").to_string_lossy());
        assert_eq!(
            item.caption_html.as_deref(),
            Some("<h4>Eiffel</h4><p>From the river</p><p>Taken Jun 15, 2023</p>")
        );
    }

    #[tokio::test]
    async fn bad_image_is_kept_without_size_and_recorded() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("trip");
        write_image(&folder.join("large/broken.jpg"), b"not really a jpeg");
        write_image(&folder.join("large/ok.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&folder).await;
        assert_eq!(outcome.value.manifest.len(), 2);
        assert_eq!(find_image(&outcome.value.manifest, "broken.jpg").pixel_size, None);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::PixelSize);
    }

    #[tokio::test]
    async fn folder_without_large_tier_has_no_images() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("trip");
        write_image(&folder.join("stray.jpg"), &plain_jpeg(8, 8));

        let outcome = build(&folder).await;
        assert!(outcome.value.manifest.is_empty());
        assert!(outcome.errors.is_empty());
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[tokio::test]
    async fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = build_manifests(&tmp.path().join("missing"), &options()).await;
        assert!(matches!(result, Err(BuildError::Io { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unwritable_child_is_recorded_and_omitted() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("albums");
        write_image(&root.join("Good/large/a.jpg"), &plain_jpeg(8, 8));
        let locked = root.join("Locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores permissions; nothing to observe in that case.
        if std::fs::write(locked.join("probe"), b"").is_ok() {
            return;
        }

        let outcome = build(&root).await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(entry_labels(&outcome.value.manifest), vec!["gallery:Good"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::Subtree);
        assert_eq!(outcome.errors[0].path, locked);
    }

    #[tokio::test]
    async fn dead_extraction_task_is_one_recorded_image() {
        let path = PathBuf::from("albums/large/a.jpg");
        let joined = tokio::task::spawn_blocking(|| -> Outcome<Option<ImageItem>> {
            panic!("decoder blew up")
        })
        .await;

        let outcome = settle_extraction(&path, joined);
        assert_eq!(outcome.value, None);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::UnreadableImage);
        assert_eq!(outcome.errors[0].path, path);
    }

    #[test]
    fn settled_extraction_passes_value_through() {
        let outcome = settle_extraction(Path::new("a.jpg"), Ok(Outcome::ok(None)));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn node_iter_is_parent_first() {
        let leaf = |name: &str| GalleryNode {
            path: PathBuf::from(name),
            name: name.to_string(),
            is_top_level: false,
            is_bottom_level: true,
            manifest: Manifest::default(),
            children: Vec::new(),
        };
        let mut a = leaf("a");
        a.children.push(leaf("a1"));
        let mut root = leaf("root");
        root.children = vec![a, leaf("b")];

        let names: Vec<&str> = root.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
    }
}
