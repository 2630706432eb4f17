//! Gallery overrides and the tag index.
//!
//! A gallery folder may carry a hand-written `gallery.json`:
//!
//! ```json
//! { "tags": ["Travel", "travel", "Family"], "note": "kept as is" }
//! ```
//!
//! Tags are case-folded and de-duplicated when the file is loaded, keeping
//! the first occurrence's position, so the above yields `["travel", "family"]`.
//! Other keys are carried through untouched. A file that fails to parse
//! counts as `{}` and is reported as an [`ErrorRecord`].
//!
//! [`TagIndex::collect`] gathers every override below a root into a sorted
//! `tag → folders` map. Folders are listed parents first, siblings by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::outcome::{ErrorKind, ErrorRecord, Outcome};
use crate::walk::is_reserved;

/// File name of a gallery override.
pub const OVERRIDE_FILE: &str = "gallery.json";

/// Tag that hides sale links on a gallery's page.
pub const NOT_FOR_SALE: &str = "not-for-sale";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryOverride {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GalleryOverride {
    /// Parse override JSON, normalizing the tags.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let mut parsed: GalleryOverride = serde_json::from_str(json)?;
        parsed.tags = normalize_tags(parsed.tags);
        Ok(parsed)
    }

    /// Load the override of `folder`.
    ///
    /// No file means no override. An unreadable or malformed file is
    /// recorded and treated as empty.
    pub fn load(folder: &Path) -> Outcome<Self> {
        let path = folder.join(OVERRIDE_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Outcome::ok(Self::default());
            }
            Err(e) => return Self::degraded(&path, e),
        };
        match Self::parse(&content) {
            Ok(parsed) => Outcome::ok(parsed),
            Err(e) => Self::degraded(&path, e),
        }
    }

    fn degraded(path: &Path, error: impl std::fmt::Display) -> Outcome<Self> {
        tracing::warn!(path = %path.display(), "ignoring override: {error}");
        Outcome::with_errors(
            Self::default(),
            vec![ErrorRecord::new(path, ErrorKind::Override, error)],
        )
    }

    /// Sale links are shown unless the gallery is tagged `not-for-sale`.
    pub fn is_for_sale(&self) -> bool {
        !self.tags.iter().any(|tag| tag == NOT_FOR_SALE)
    }
}

/// Lower-case every tag and drop repeats, keeping first occurrences in order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.to_lowercase();
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Tag → folders whose override declares it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TagIndex {
    buckets: BTreeMap<String, Vec<PathBuf>>,
}

impl TagIndex {
    /// Scan every override file beneath `root`, `root` included.
    ///
    /// Reserved tier folders and hidden entries are not searched.
    pub fn collect(root: &Path) -> Outcome<Self> {
        let mut index = TagIndex::default();
        let mut errors = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by(|a, b| {
                let a_dir = a.file_type().is_dir();
                let b_dir = b.file_type().is_dir();
                a_dir.cmp(&b_dir).then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || searchable(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    tracing::warn!(path = %path.display(), "skipping while collecting tags: {e}");
                    errors.push(ErrorRecord::new(path, ErrorKind::Subtree, e));
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != OVERRIDE_FILE {
                continue;
            }
            let Some(folder) = entry.path().parent() else {
                continue;
            };
            let parsed = GalleryOverride::load(folder).merge_into(&mut errors);
            index.insert(folder, &parsed.tags);
        }

        tracing::info!(tags = index.len(), "collected tags");
        Outcome::with_errors(index, errors)
    }

    /// Record `folder` under each of `tags`.
    pub fn insert(&mut self, folder: &Path, tags: &[String]) {
        for tag in tags {
            let bucket = self.buckets.entry(tag.clone()).or_default();
            if !bucket.iter().any(|existing| existing == folder) {
                bucket.push(folder.to_path_buf());
            }
        }
    }

    /// All tags, ascending.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Folders tagged `tag`, parents first.
    pub fn galleries(&self, tag: &str) -> &[PathBuf] {
        self.buckets.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn searchable(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    !name.starts_with('.') && !(entry.file_type().is_dir() && is_reserved(&name))
}
