//! Folder and file naming conventions.
//!
//! Gallery folders carry their ordering in their names. A folder whose name
//! starts with a year (`2021 Iceland`) or a year and month (`2023-06_Paris`)
//! is *dated*; anything else is *undated*. Listings are ordered most recent
//! first, with undated entries after all dated ones:
//!
//! ```text
//! 2023-06_Paris
//! 2023-01_Snow
//! 2023_Misc
//! 2019 Road Trip
//! Family
//! Pets
//! ```
//!
//! ## Display Titles
//!
//! Folder names become titles by turning underscores into spaces and
//! capitalizing each word: `new_york city` → "New York City".

use std::cmp::Ordering;

/// Ordering key parsed from the start of an entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Dated { year: u16, month: Option<u8> },
    Undated,
}

impl SortKey {
    /// Parse a `YYYY` or `YYYY-MM` prefix.
    ///
    /// A month outside 01-12 is ignored, leaving only the year.
    pub fn parse(name: &str) -> Self {
        let bytes = name.as_bytes();
        let digits = |range: std::ops::Range<usize>| {
            bytes.get(range.clone()).is_some_and(|s| s.iter().all(u8::is_ascii_digit))
        };

        if !digits(0..4) {
            return SortKey::Undated;
        }
        let year = name[..4].parse().unwrap_or(0);

        let month = if bytes.get(4) == Some(&b'-') && digits(5..7) {
            name[5..7].parse::<u8>().ok().filter(|m| (1..=12).contains(m))
        } else {
            None
        };

        SortKey::Dated { year, month }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Dated { .. }, SortKey::Undated) => Ordering::Less,
            (SortKey::Undated, SortKey::Dated { .. }) => Ordering::Greater,
            (SortKey::Undated, SortKey::Undated) => Ordering::Equal,
            // Descending: newer first; a known month ranks above a bare year.
            (
                SortKey::Dated { year: ya, month: ma },
                SortKey::Dated { year: yb, month: mb },
            ) => yb.cmp(ya).then_with(|| mb.cmp(ma)),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two entry names in gallery listing order.
pub fn compare_entry_names(a: &str, b: &str) -> Ordering {
    SortKey::parse(a)
        .cmp(&SortKey::parse(b))
        .then_with(|| a.cmp(b))
}

/// Sort entry names in place in gallery listing order.
pub fn sort_entry_names(names: &mut [String]) {
    names.sort_by(|a, b| compare_entry_names(a, b));
}

/// Turn a folder name into a display title.
///
/// - `2023-06_Paris` → "2023-06 Paris"
/// - `new_york city` → "New York City"
/// - `SUMMER` → "Summer"
pub fn format_name(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// File stem of a name, e.g. `cover.JPG` → `cover`.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(pos) => &file_name[..pos],
    }
}
