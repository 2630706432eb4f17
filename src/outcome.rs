//! Recoverable error records travelling alongside results.
//!
//! Most problems met while building a site only affect one image or one
//! override file. Builders keep going, return what they could produce, and
//! hand back the problems as [`ErrorRecord`]s. Callers merge the lists they
//! receive; the final summary reports the total.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Image bytes could not be read from disk.
    UnreadableImage,
    /// Header could not be parsed for pixel dimensions.
    PixelSize,
    /// A `gallery.json` failed to parse.
    Override,
    /// A subfolder's manifest could not be built; it was left out of its parent.
    Subtree,
    /// A derived size tier could not be produced.
    Resize,
    /// A file could not be copied into the output tree.
    Copy,
    /// A page could not be written.
    Page,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnreadableImage => "unreadable image",
            ErrorKind::PixelSize => "pixel size",
            ErrorKind::Override => "gallery.json",
            ErrorKind::Subtree => "gallery",
            ErrorKind::Resize => "resize",
            ErrorKind::Copy => "copy",
            ErrorKind::Page => "page",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(path: impl AsRef<Path>, kind: ErrorKind, message: impl fmt::Display) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path.display(), self.message, self.kind)
    }
}

/// A value plus the recoverable errors met while producing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub errors: Vec<ErrorRecord>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(value: T, errors: Vec<ErrorRecord>) -> Self {
        Self { value, errors }
    }

    /// Move this outcome's errors into `sink` and return the value.
    pub fn merge_into(self, sink: &mut Vec<ErrorRecord>) -> T {
        sink.extend(self.errors);
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            errors: self.errors,
        }
    }
}
