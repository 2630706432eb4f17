//! Pure dimension math, testable without pixels.

/// Dimensions that fit `source` inside a `max_edge`×`max_edge` box.
///
/// Aspect ratio is preserved and images already inside the box keep their
/// size. Neither edge rounds down to zero.
///
/// ```text
/// (4000, 3000) in 800 → (800, 600)
/// (3000, 4000) in 800 → (600, 800)
/// ( 640,  480) in 800 → (640, 480)
/// ```
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return (w, h);
    }

    let scale = max_edge as f64 / longer as f64;
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);

    if w >= h {
        (max_edge, scaled(h))
    } else {
        (scaled(w), max_edge)
    }
}

/// Whether `fit_within` would change the image.
pub fn needs_resize(source: (u32, u32), max_edge: u32) -> bool {
    fit_within(source, max_edge) != source
}

/// Dimensions after applying an EXIF orientation code.
///
/// Codes 5-8 involve a quarter turn, which swaps width and height.
pub fn oriented_dimensions(source: (u32, u32), orientation: u16) -> (u32, u32) {
    match orientation {
        5..=8 => (source.1, source.0),
        _ => source,
    }
}
