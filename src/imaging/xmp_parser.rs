//! Minimal XMP reader for `dc:title` and `dc:description`.
//!
//! XMP is an RDF/XML packet embedded verbatim in the file (JPEG APP1 with the
//! `http://ns.adobe.com/xap/1.0/` namespace, a PNG `iTXt` chunk, a TIFF tag).
//! Rather than parse each container, the raw bytes are searched for the
//! `<x:xmpmeta>` packet and the two fields are pulled out of it.
//!
//! Both fields are language alternatives:
//!
//! ```text
//! <dc:title>
//!   <rdf:Alt>
//!     <rdf:li xml:lang="x-default">Eiffel Tower at dusk</rdf:li>
//!   </rdf:Alt>
//! </dc:title>
//! ```
//!
//! The first `rdf:li` wins. The attribute shorthand `dc:title="..."` on
//! `rdf:Description` is accepted too.

/// Title and description found in an XMP packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpData {
    pub title: Option<String>,
    pub description: Option<String>,
}

const PACKET_START: &[u8] = b"<x:xmpmeta";
const PACKET_END: &[u8] = b"</x:xmpmeta>";

/// Extract XMP fields from raw file bytes. Returns default on any miss.
pub fn read_xmp(bytes: &[u8]) -> XmpData {
    let Some(packet) = find_packet(bytes) else {
        return XmpData::default();
    };
    XmpData {
        title: dc_field(packet, "title"),
        description: dc_field(packet, "description"),
    }
}

fn find_packet(bytes: &[u8]) -> Option<&str> {
    let start = find(bytes, PACKET_START, 0)?;
    let end = find(bytes, PACKET_END, start)? + PACKET_END.len();
    std::str::from_utf8(&bytes[start..end]).ok()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

// ---------------------------------------------------------------------------
// Field lookup
// ---------------------------------------------------------------------------

fn dc_field(packet: &str, name: &str) -> Option<String> {
    element_value(packet, name)
        .or_else(|| attribute_value(packet, name))
        .map(|raw| decode_entities(raw.trim()))
        .filter(|s| !s.is_empty())
}

/// `<dc:NAME ...> ... <rdf:li ...>VALUE</rdf:li> ... </dc:NAME>`
fn element_value<'a>(packet: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<dc:{name}");
    let close = format!("</dc:{name}>");

    let mut search = 0;
    let start = loop {
        let pos = packet[search..].find(&open)? + search;
        let after = pos + open.len();
        // Skip `<dc:titleFoo`
        match packet[after..].chars().next() {
            Some('>') | Some(' ') | Some('\n') | Some('\t') | Some('\r') => break after,
            _ => search = after,
        }
    };
    let body_start = start + packet[start..].find('>')? + 1;
    let body_end = body_start + packet[body_start..].find(&close)?;
    let body = &packet[body_start..body_end];

    match body.find("<rdf:li") {
        Some(li) => {
            let value_start = li + body[li..].find('>')? + 1;
            let value_end = value_start + body[value_start..].find("</rdf:li>")?;
            Some(&body[value_start..value_end])
        }
        // Simple property without a container.
        None if !body.contains('<') => Some(body),
        None => None,
    }
}

/// `dc:NAME="VALUE"`
fn attribute_value<'a>(packet: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("dc:{name}=\"");
    let start = packet.find(&needle)? + needle.len();
    let end = start + packet[start..].find('"')?;
    Some(&packet[start..end])
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
