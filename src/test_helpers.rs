//! Shared test utilities.
//!
//! Builds synthetic photos in memory and lays out gallery trees on disk so
//! tests never depend on checked-in binary fixtures.
//!
//! ```rust
//! let jpeg = JpegFixture::new(64, 48)
//!     .taken("2023:06:15 10:30:00")
//!     .gps(('N', [48.0, 51.0, 24.0]), ('E', [2.0, 21.0, 0.0]))
//!     .xmp_title("Eiffel")
//!     .build();
//! write_image(&tmp.path().join("gallery/2023-06_Paris/large/a.jpg"), &jpeg);
//! ```

use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::path::Path;

use crate::types::{ImageItem, Manifest};

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode a plain JPEG with a gradient so the encoder has something to chew on.
pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a plain PNG.
pub fn plain_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Builder for a JPEG carrying EXIF and XMP segments.
pub struct JpegFixture {
    width: u32,
    height: u32,
    date_original: Option<String>,
    date_plain: Option<String>,
    orientation: Option<u16>,
    gps: Option<((char, [f64; 3]), (char, [f64; 3]))>,
    xmp: Option<String>,
}

impl JpegFixture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            date_original: None,
            date_plain: None,
            orientation: None,
            gps: None,
            xmp: None,
        }
    }

    /// `DateTimeOriginal`, formatted `YYYY:MM:DD HH:MM:SS`.
    pub fn taken(mut self, date: &str) -> Self {
        self.date_original = Some(date.to_string());
        self
    }

    /// Plain `DateTime` in IFD0.
    pub fn modified(mut self, date: &str) -> Self {
        self.date_plain = Some(date.to_string());
        self
    }

    pub fn orientation(mut self, value: u16) -> Self {
        self.orientation = Some(value);
        self
    }

    pub fn gps(mut self, lat: (char, [f64; 3]), lng: (char, [f64; 3])) -> Self {
        self.gps = Some((lat, lng));
        self
    }

    pub fn xmp_title(self, title: &str) -> Self {
        self.xmp_fields(Some(title), None)
    }

    pub fn xmp_fields(mut self, title: Option<&str>, description: Option<&str>) -> Self {
        self.xmp = Some(xmp_packet(title, description));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let jpeg = plain_jpeg(self.width, self.height);
        let mut segments = Vec::new();

        let has_exif = self.date_original.is_some()
            || self.date_plain.is_some()
            || self.orientation.is_some()
            || self.gps.is_some();
        if has_exif {
            let mut payload = b"Exif\0\0".to_vec();
            payload.extend(self.tiff());
            segments.extend(app1(&payload));
        }
        if let Some(xmp) = &self.xmp {
            let mut payload = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
            payload.extend(xmp.as_bytes());
            segments.extend(app1(&payload));
        }

        // Segments go right after SOI.
        let mut out = jpeg[..2].to_vec();
        out.extend(segments);
        out.extend(&jpeg[2..]);
        out
    }

    fn tiff(&self) -> Vec<u8> {
        let mut ifd0 = Vec::new();
        if let Some(o) = self.orientation {
            ifd0.push(Field::short(0x0112, o));
        }
        if let Some(d) = &self.date_plain {
            ifd0.push(Field::ascii(0x0132, d));
        }

        let mut exif = Vec::new();
        if let Some(d) = &self.date_original {
            exif.push(Field::ascii(0x9003, d));
        }

        let mut gps = Vec::new();
        if let Some(((lat_ref, lat), (lng_ref, lng))) = &self.gps {
            gps.push(Field::ascii(0x0001, &lat_ref.to_string()));
            gps.push(Field::rationals(0x0002, lat));
            gps.push(Field::ascii(0x0003, &lng_ref.to_string()));
            gps.push(Field::rationals(0x0004, lng));
        }

        // Pointer entries are sized now and patched once offsets are known.
        let has_exif_ifd = !exif.is_empty();
        let has_gps_ifd = !gps.is_empty();
        if has_exif_ifd {
            ifd0.push(Field::long(0x8769, 0));
        }
        if has_gps_ifd {
            ifd0.push(Field::long(0x8825, 0));
        }
        ifd0.sort_by_key(|f| f.tag);

        let ifd0_offset = 8u32;
        let exif_offset = ifd0_offset + ifd_size(&ifd0);
        let gps_offset = exif_offset + if has_exif_ifd { ifd_size(&exif) } else { 0 };
        for field in &mut ifd0 {
            match field.tag {
                0x8769 => field.data = exif_offset.to_le_bytes().to_vec(),
                0x8825 => field.data = gps_offset.to_le_bytes().to_vec(),
                _ => {}
            }
        }

        let mut out = b"II*\0".to_vec();
        out.extend(ifd0_offset.to_le_bytes());
        write_ifd(&mut out, &ifd0);
        if has_exif_ifd {
            write_ifd(&mut out, &exif);
        }
        if has_gps_ifd {
            write_ifd(&mut out, &gps);
        }
        out
    }
}

fn app1(payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 2) as u16;
    let mut out = vec![0xFF, 0xE1];
    out.extend(len.to_be_bytes());
    out.extend(payload);
    out
}

/// Minimal XMP packet with `dc:title` / `dc:description` language alternatives.
pub fn xmp_packet(title: Option<&str>, description: Option<&str>) -> String {
    let alt = |name: &str, value: Option<&str>| {
        value
            .map(|v| {
                format!(
                    "<dc:{name}><rdf:Alt><rdf:li xml:lang=\"x-default\">{v}</rdf:li></rdf:Alt></dc:{name}>"
                )
            })
            .unwrap_or_default()
    };
    format!(
        "<?xpacket begin=\"\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\
         <x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\
         <rdf:Description rdf:about=\"\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
         {}{}\
         </rdf:Description></rdf:RDF></x:xmpmeta>\
         <?xpacket end=\"w\"?>",
        alt("title", title),
        alt("description", description),
    )
}

struct Field {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Field {
    fn short(tag: u16, value: u16) -> Self {
        Self {
            tag,
            kind: 3,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            kind: 4,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            kind: 2,
            count: data.len() as u32,
            data,
        }
    }

    fn rationals(tag: u16, values: &[f64; 3]) -> Self {
        let mut data = Vec::new();
        for v in values {
            let num = (v * 100.0).round() as u32;
            data.extend(num.to_le_bytes());
            data.extend(100u32.to_le_bytes());
        }
        Self {
            tag,
            kind: 5,
            count: 3,
            data,
        }
    }

    fn external_len(&self) -> u32 {
        if self.data.len() > 4 {
            let len = self.data.len() as u32;
            len + (len % 2)
        } else {
            0
        }
    }
}

fn ifd_size(fields: &[Field]) -> u32 {
    2 + 12 * fields.len() as u32 + 4 + fields.iter().map(Field::external_len).sum::<u32>()
}

/// Append an IFD at the current end of `out`, with out-of-line values after it.
fn write_ifd(out: &mut Vec<u8>, fields: &[Field]) {
    let start = out.len() as u32;
    let mut data_offset = start + 2 + 12 * fields.len() as u32 + 4;
    let mut external = Vec::new();

    out.extend((fields.len() as u16).to_le_bytes());
    for field in fields {
        out.extend(field.tag.to_le_bytes());
        out.extend(field.kind.to_le_bytes());
        out.extend(field.count.to_le_bytes());
        if field.data.len() <= 4 {
            let mut inline = field.data.clone();
            inline.resize(4, 0);
            out.extend(inline);
        } else {
            out.extend(data_offset.to_le_bytes());
            external.extend(&field.data);
            if field.data.len() % 2 == 1 {
                external.push(0);
            }
            data_offset += field.external_len();
        }
    }
    out.extend(0u32.to_le_bytes());
    out.extend(external);
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write bytes to `path`, creating parent directories.
pub fn write_image(path: &Path, bytes: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Write a `gallery.json` override into `dir`.
pub fn write_override(dir: &Path, json: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("gallery.json"), json).unwrap();
}

// =========================================================================
// Manifest lookups, panicking with a clear message on miss
// =========================================================================

/// Find an image entry by file name. Panics if not found.
pub fn find_image<'a>(manifest: &'a Manifest, file_name: &str) -> &'a ImageItem {
    manifest
        .images()
        .find(|i| i.file_name == file_name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = manifest.images().map(|i| i.file_name.as_str()).collect();
            panic!("image '{file_name}' not found. Available: {names:?}")
        })
}

/// Entry labels in manifest order: gallery titles and image file names.
pub fn entry_labels(manifest: &Manifest) -> Vec<String> {
    manifest
        .entries
        .iter()
        .map(|e| match e {
            crate::types::Entry::Gallery(g) => format!("gallery:{}", g.title),
            crate::types::Entry::Image(i) => format!("image:{}", i.file_name),
        })
        .collect()
}
