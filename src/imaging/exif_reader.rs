//! EXIF fields the gallery cares about: capture date, GPS position, orientation.
//!
//! Each field is looked up independently, so a broken GPS block never costs
//! the capture date. Any parse failure just yields `None`.

use chrono::NaiveDate;
use exif::{Exif, In, Reader, Tag, Value};
use std::io::Cursor;

use crate::types::Location;

/// Parsed EXIF container of an image held in memory.
pub struct ExifFields {
    exif: Exif,
}

impl ExifFields {
    /// Parse EXIF from JPEG, TIFF, PNG or WebP bytes.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        let mut cursor = Cursor::new(bytes);
        Reader::new()
            .read_from_container(&mut cursor)
            .ok()
            .map(|exif| Self { exif })
    }

    /// Capture time as unix seconds, treating the camera clock as UTC.
    ///
    /// Tries `DateTimeOriginal`, then `DateTimeDigitized`, then `DateTime`.
    pub fn capture_timestamp(&self) -> Option<i64> {
        [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
            .into_iter()
            .find_map(|tag| self.timestamp(tag))
    }

    fn timestamp(&self, tag: Tag) -> Option<i64> {
        let field = self.exif.get_field(tag, In::PRIMARY)?;
        let Value::Ascii(ref parts) = field.value else {
            return None;
        };
        let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
        NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?
            .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())
            .map(|naive| naive.and_utc().timestamp())
    }

    /// GPS position in decimal degrees; `None` unless both axes are present.
    pub fn location(&self) -> Option<Location> {
        let lat = self.gps_coord(Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
        let lng = self.gps_coord(Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
        Some(Location { lat, lng })
    }

    fn gps_coord(&self, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let coord = self.exif.get_field(coord_tag, In::PRIMARY)?;
        let degrees = dms_to_degrees(&coord.value)?;

        // Missing reference counts as N/E.
        let negative = self
            .exif
            .get_field(ref_tag, In::PRIMARY)
            .map(|r| {
                let s = r.display_value().to_string();
                s.contains('S') || s.contains('W')
            })
            .unwrap_or(false);

        Some(if negative { -degrees } else { degrees })
    }

    /// EXIF orientation code, 1 through 8.
    pub fn orientation(&self) -> Option<u16> {
        self.exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().copied(),
                Value::Long(v) => v.first().and_then(|&x| u16::try_from(x).ok()),
                _ => None,
            })
            .filter(|o| (1..=8).contains(o))
    }
}

fn dms_to_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let degrees = parts[0].to_f64();
            let minutes = parts[1].to_f64();
            let seconds = parts[2].to_f64();
            let total = degrees + minutes / 60.0 + seconds / 3600.0;
            total.is_finite().then_some(total)
        }
        _ => None,
    }
}
