//! Carry EXIF and XMP across a JPEG re-encode.
//!
//! The `image` encoder writes bare JPEGs. The large tier has to keep the
//! source's capture date, GPS block and XMP packet, because gallery
//! manifests are built from the large files. This module lifts the APP1
//! segments out of the source and splices them into the encoded output.
//!
//! The pixels are already rotated upright when re-encoded, so the copied
//! EXIF orientation is reset to 1 (normal).

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

const ORIENTATION_TAG: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;

/// Walk the header segments of a JPEG, yielding `(marker, start, end)` for
/// every segment with a length field. Stops at the first scan.
fn segments(data: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut found = Vec::new();
    if !data.starts_with(&SOI) {
        return found;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill byte before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            break;
        }
        // Markers without length field
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 2 + len;
        if len < 2 || end > data.len() {
            break;
        }
        found.push((marker, pos, end));
        pos = end;
    }
    found
}

/// EXIF and XMP APP1 segments of a JPEG, each including marker and length.
pub fn metadata_segments(data: &[u8]) -> Vec<Vec<u8>> {
    segments(data)
        .into_iter()
        .filter(|&(marker, start, end)| {
            let payload = &data[start + 4..end];
            marker == APP1 && (payload.starts_with(EXIF_HEADER) || payload.starts_with(XMP_HEADER))
        })
        .map(|(_, start, end)| data[start..end].to_vec())
        .collect()
}

/// Insert segments after SOI and any JFIF APP0. `None` if `jpeg` is not a JPEG.
pub fn insert_segments(jpeg: &[u8], extra: &[Vec<u8>]) -> Option<Vec<u8>> {
    if !jpeg.starts_with(&SOI) {
        return None;
    }
    let at = match segments(jpeg).first() {
        Some(&(APP0, _, end)) => end,
        _ => 2,
    };

    let mut out = Vec::with_capacity(jpeg.len() + extra.iter().map(Vec::len).sum::<usize>());
    out.extend_from_slice(&jpeg[..at]);
    for segment in extra {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&jpeg[at..]);
    Some(out)
}

/// Overwrite the IFD0 orientation value of an EXIF APP1 segment with 1.
///
/// Leaves the segment untouched when it is not EXIF or has no orientation.
pub fn reset_orientation(segment: &mut [u8]) {
    let tiff_start = 4 + EXIF_HEADER.len();
    if segment.len() < tiff_start + 8 || !segment[4..].starts_with(EXIF_HEADER) {
        return;
    }
    let tiff = &mut segment[tiff_start..];

    let big_endian = match &tiff[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return,
    };
    let read_u16 = |data: &[u8], offset: usize| -> Option<u16> {
        let bytes = [*data.get(offset)?, *data.get(offset + 1)?];
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };
    let read_u32 = |data: &[u8], offset: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    let Some(ifd) = read_u32(tiff, 4).map(|o| o as usize) else {
        return;
    };
    let Some(count) = read_u16(tiff, ifd) else {
        return;
    };

    for i in 0..count as usize {
        let entry = ifd + 2 + i * 12;
        let (Some(tag), Some(kind)) = (read_u16(tiff, entry), read_u16(tiff, entry + 2)) else {
            return;
        };
        if tag == ORIENTATION_TAG && kind == TYPE_SHORT && entry + 10 <= tiff.len() {
            let one = if big_endian {
                1u16.to_be_bytes()
            } else {
                1u16.to_le_bytes()
            };
            tiff[entry + 8..entry + 10].copy_from_slice(&one);
            return;
        }
    }
}

/// Copy the EXIF and XMP of `source` into freshly encoded `encoded`.
///
/// Returns `encoded` unchanged when either side is not a JPEG or the source
/// has nothing to carry.
pub fn carry_metadata(source: &[u8], encoded: Vec<u8>) -> Vec<u8> {
    let mut carried = metadata_segments(source);
    if carried.is_empty() {
        return encoded;
    }
    for segment in &mut carried {
        reset_orientation(segment);
    }
    insert_segments(&encoded, &carried).unwrap_or(encoded)
}
