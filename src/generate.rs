//! HTML site generation.
//!
//! Renders the pages that consume the gallery manifests, plus the few static
//! assets they reference.
//!
//! ## Generated Pages
//!
//! - **Top-level page** (`/index.html`): tiles of the top-level galleries
//! - **Gallery pages** (`/gallery/<path>/index.html`): subgallery tiles, then photos
//! - **Tag pages** (`/gallery/tag_<tag>.html`): every gallery carrying a tag
//! - **Error page** (`/error.html`)
//!
//! ## Output Structure
//!
//! ```text
//! build/
//! ├── index.html                  # top-level gallery, written one level up
//! ├── error.html
//! ├── favicon.ico                 # copied from the source root when present
//! ├── static/
//! │   ├── css/style.css
//! │   └── images/not_found.png    # cover of galleries without photos
//! └── gallery/
//!     ├── index.json
//!     ├── tag_travel.html
//!     └── 2023-06_Paris/
//!         ├── index.html
//!         ├── index.json
//!         └── large/ medium/ thumbs/
//! ```
//!
//! Every page links the same stylesheet by absolute URL. Photo and tile URLs
//! come from the manifests and are relative to the page's folder; the
//! top-level page lives above its folder, so its own photos are promoted
//! once more by the top-level folder name.
//!
//! Pages are rendered with [maud](https://maud.lambda.xyz/), so titles,
//! captions and tags are escaped unless they are pre-rendered captions or the
//! configured footer.

use crate::config::SiteConfig;
use crate::cover::{PLACEHOLDER_EDGE, PLACEHOLDER_URL, cover_for_parent, promote_cover};
use crate::manifest::{GalleryNode, load_manifest};
use crate::naming::format_name;
use crate::outcome::{ErrorKind, ErrorRecord, Outcome};
use crate::tags::{GalleryOverride, TagIndex};
use crate::types::{Entry, GalleryItem, ImageItem};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const CSS: &str = include_str!("../static/style.css");

/// Site URL of the stylesheet.
pub const STYLESHEET_URL: &str = "/static/css/style.css";

/// Where the site lives on disk.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Site root, served as `/`.
    pub output_root: PathBuf,
    /// `<output_root>/<top_level_name>`, the manifest tree.
    pub gallery_root: PathBuf,
    /// Source root, searched for `favicon.ico`.
    pub source_root: PathBuf,
}

impl SiteLayout {
    pub fn new(source_root: &Path, output_root: &Path, config: &SiteConfig) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            gallery_root: output_root.join(&config.top_level_name),
            source_root: source_root.to_path_buf(),
        }
    }

    fn top_level_name(&self) -> String {
        self.gallery_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Site URL of a folder inside the output tree, with a trailing slash.
    fn folder_url(&self, folder: &Path) -> String {
        let segments = url_segments(&self.output_root, folder);
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        }
    }
}

fn url_segments(base: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(base)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// File name of the page listing galleries tagged `tag`.
///
/// Always a single path segment: separators and URL delimiters become `_`,
/// as does a leading dot.
pub fn tag_page_name(tag: &str) -> String {
    let mut stem: String = tag
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '#' | '%' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.starts_with('.') {
        stem.replace_range(..1, "_");
    }
    format!("tag_{stem}.html")
}

/// Files written by [`render_site`].
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub gallery_pages: Vec<PathBuf>,
    pub tag_pages: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

// ============================================================================
// Page context
// ============================================================================

/// Everything a gallery page shows besides its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    /// `<Gallery> - <site title>`, or the site title at the top level.
    pub gallery_title: String,
    /// Content of `<title>`: the gallery title plus the site description.
    pub document_title: String,
    /// `(label, url)` from the site root down to this gallery.
    pub breadcrumbs: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub show_sale_links: bool,
}

/// Page context of one built gallery.
///
/// A top-level gallery without tags of its own lists every known tag.
/// Sale links only show on leaf galleries below the top level that are not
/// tagged `not-for-sale`.
pub fn page_context(
    node: &GalleryNode,
    gallery: &GalleryOverride,
    index: &TagIndex,
    layout: &SiteLayout,
    config: &SiteConfig,
) -> PageContext {
    let gallery_title = if node.is_top_level {
        config.title.clone()
    } else {
        format!("{} - {}", format_name(&node.name), config.title)
    };
    let tags = if node.is_top_level && gallery.tags.is_empty() {
        index.tags().map(str::to_string).collect()
    } else {
        gallery.tags.clone()
    };

    PageContext {
        document_title: document_title(&gallery_title, config),
        gallery_title,
        breadcrumbs: breadcrumbs(layout, &node.path),
        tags,
        show_sale_links: gallery.is_for_sale() && node.is_bottom_level && !node.is_top_level,
    }
}

fn document_title(gallery_title: &str, config: &SiteConfig) -> String {
    if config.description.is_empty() {
        gallery_title.to_string()
    } else {
        format!("{gallery_title} : {}", config.description)
    }
}

fn breadcrumbs(layout: &SiteLayout, folder: &Path) -> Vec<(String, String)> {
    let mut crumbs = vec![("Home".to_string(), "/".to_string())];
    let mut url = String::from("/");
    for (depth, segment) in url_segments(&layout.output_root, folder).iter().enumerate() {
        url.push_str(segment);
        url.push('/');
        // The top-level folder is the home page itself.
        if depth > 0 {
            crumbs.push((format_name(segment), url.clone()));
        }
    }
    crumbs
}

// ============================================================================
// Rendering the site
// ============================================================================

/// Write every page and asset of the site.
///
/// Tag pages read the manifests already written to disk. A tagged gallery
/// whose manifest is missing is recorded and left off the page.
pub fn render_site(
    tree: &GalleryNode,
    index: &TagIndex,
    layout: &SiteLayout,
    config: &SiteConfig,
) -> Result<Outcome<RenderSummary>, RenderError> {
    let mut summary = RenderSummary::default();
    let mut errors = Vec::new();

    for node in tree.iter() {
        // Parse problems were already reported by the tag scan.
        let gallery = GalleryOverride::load(&node.path).value;
        let context = page_context(node, &gallery, index, layout, config);
        let page = render_gallery_page(node, &context, layout, config);

        let dir = if node.is_top_level {
            &layout.output_root
        } else {
            &node.path
        };
        summary.gallery_pages.push(write_page(dir, "index.html", page)?);
    }

    for tag in index.tags() {
        let tagged = tag_galleries(index, tag, layout).merge_into(&mut errors);
        let page = render_tag_page(tag, &tagged, index, layout, config);
        match write_page(&layout.gallery_root, &tag_page_name(tag), page) {
            Ok(path) => summary.tag_pages.push(path),
            Err(e) => {
                tracing::warn!(tag, "tag page not written: {e}");
                let path = layout.gallery_root.join(tag_page_name(tag));
                errors.push(ErrorRecord::new(path, ErrorKind::Page, e));
            }
        }
    }

    summary
        .gallery_pages
        .push(write_page(&layout.output_root, "error.html", render_error_page(config))?);
    summary.assets = write_assets(layout)?;

    tracing::info!(
        pages = summary.gallery_pages.len(),
        tag_pages = summary.tag_pages.len(),
        "rendered site"
    );
    Ok(Outcome::with_errors(summary, errors))
}

fn write_page(dir: &Path, name: &str, page: Markup) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;
    let path = dir.join(name);
    fs::write(&path, page.into_string()).map_err(|e| RenderError::io(&path, e))?;
    tracing::debug!(path = %path.display(), "wrote page");
    Ok(path)
}

/// Tiles of the galleries tagged `tag`, relative to the tag page's folder.
pub fn tag_galleries(index: &TagIndex, tag: &str, layout: &SiteLayout) -> Outcome<Vec<GalleryItem>> {
    let mut errors = Vec::new();
    let mut tiles = Vec::new();

    for folder in index.galleries(tag) {
        let manifest = match load_manifest(folder) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(path = %folder.display(), "left off tag page: {e}");
                errors.push(ErrorRecord::new(folder, ErrorKind::Subtree, e));
                continue;
            }
        };

        let url_path = url_segments(&layout.gallery_root, folder).join("/");
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut cover_image = cover_for_parent(&manifest, &url_path);
        if url_path.is_empty() {
            // Subgallery covers of the top level point from the site root.
            let top = format!("{}/", layout.top_level_name());
            cover_image.variants = cover_image
                .variants
                .map(|url| url.strip_prefix(&top).unwrap_or(url).to_string());
        }
        tiles.push(GalleryItem {
            cover_image,
            title: format_name(&name),
            folder_path: folder.clone(),
            url_path,
        });
    }
    Outcome::with_errors(tiles, errors)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, config: &SiteConfig, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !config.description.is_empty() {
                    meta name="description" content=(config.description);
                }
                title { (title) }
                link rel="stylesheet" href=(STYLESHEET_URL);
            }
            body {
                (content)
                footer.site-footer {
                    (PreEscaped(&config.footer_html))
                }
            }
        }
    }
}

fn render_breadcrumbs(crumbs: &[(String, String)]) -> Markup {
    html! {
        nav.breadcrumbs {
            @for (idx, (label, url)) in crumbs.iter().enumerate() {
                @if idx > 0 {
                    span.breadcrumb { "»" }
                }
                a.breadcrumb href=(url) { (label) }
            }
        }
    }
}

fn render_tag_links(tags: &[String], current: Option<&str>, layout: &SiteLayout) -> Markup {
    let base = layout.folder_url(&layout.gallery_root);
    html! {
        @if !tags.is_empty() {
            ul.tags {
                @for tag in tags {
                    li class=[(current == Some(tag.as_str())).then_some("current")] {
                        a href={ (base) (tag_page_name(tag)) } { (tag) }
                    }
                }
            }
        }
    }
}

/// Tile linking to a subgallery.
fn gallery_tile(gallery: &GalleryItem) -> Markup {
    let href = if gallery.url_path.is_empty() {
        "/".to_string()
    } else {
        format!("{}/", gallery.url_path)
    };
    html! {
        div.grid-item.gallery-tile {
            a.photo-link href=(href) {
                img src=(gallery.cover_image.variants.medium) alt=(gallery.title) loading="lazy";
            }
            a.photo-link-title href=(href) { (gallery.title) }
        }
    }
}

/// Tile of one photo, with the data attributes the lightbox script reads.
fn image_tile(image: &ImageItem, show_sale_links: bool) -> Markup {
    let responsive = format!(
        "{} 200, {} 800, {} 2400",
        image.variants.thumb, image.variants.medium, image.variants.large
    );
    let wide = image
        .pixel_size
        .is_some_and(|size| u64::from(size.width) > u64::from(size.height) * 2);
    html! {
        div.grid-item.grid-item-wide[wide]
            data-src=(image.variants.large)
            data-responsive=(responsive)
            data-sub-html=[image.caption_html.as_deref()] {
            a.photo-link href=(image.variants.large) {
                img src=(image.variants.medium) alt=(image.display_title) loading="lazy";
            }
            @if show_sale_links {
                span.sale-link { "Prints available" }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a gallery page from its manifest
fn render_gallery_page(
    node: &GalleryNode,
    context: &PageContext,
    layout: &SiteLayout,
    config: &SiteConfig,
) -> Markup {
    let content = html! {
        div.gallery-wrapper {
            h1.gallery-title { (context.gallery_title) }
            @if node.is_top_level && !config.description.is_empty() {
                div.gallery-description { (config.description) }
            }
            (render_breadcrumbs(&context.breadcrumbs))
            (render_tag_links(&context.tags, None, layout))
            @if node.manifest.is_empty() {
                div.warning { h3 { "No Galleries Found" } }
            } @else {
                div.grid.gallery {
                    @for entry in &node.manifest.entries {
                        @match entry {
                            Entry::Gallery(gallery) => { (gallery_tile(gallery)) }
                            Entry::Image(image) => {
                                @if node.is_top_level {
                                    (image_tile(&promote_cover(image, &node.name), context.show_sale_links))
                                } @else {
                                    (image_tile(image, context.show_sale_links))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base_document(&context.document_title, config, content)
}

/// Renders the page of one tag
fn render_tag_page(
    tag: &str,
    galleries: &[GalleryItem],
    index: &TagIndex,
    layout: &SiteLayout,
    config: &SiteConfig,
) -> Markup {
    let gallery_title = format!("[{tag}] galleries - {}", config.title);
    let all_tags: Vec<String> = index.tags().map(str::to_string).collect();
    let mut crumbs = breadcrumbs(layout, &layout.gallery_root);
    crumbs.push((tag.to_string(), tag_page_name(tag)));

    let content = html! {
        div.gallery-wrapper {
            h1.gallery-title { (gallery_title) }
            (render_breadcrumbs(&crumbs))
            (render_tag_links(&all_tags, Some(tag), layout))
            div.grid.gallery.gallery-index {
                @for gallery in galleries {
                    (gallery_tile(gallery))
                }
            }
        }
    };

    base_document(&document_title(&gallery_title, config), config, content)
}

fn render_error_page(config: &SiteConfig) -> Markup {
    let content = html! {
        div.gallery-wrapper {
            h1.gallery-title { (config.title) }
            div.warning {
                h3 { "Page not found" }
                a href="/" { "Back to the galleries" }
            }
        }
    };
    base_document(&document_title(&config.title, config), config, content)
}

// ============================================================================
// Assets
// ============================================================================

/// Write the stylesheet and placeholder image, and copy the favicon.
fn write_assets(layout: &SiteLayout) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();

    let css_path = site_file(&layout.output_root, STYLESHEET_URL);
    write_file(&css_path, CSS.as_bytes())?;
    written.push(css_path);

    let placeholder_path = site_file(&layout.output_root, PLACEHOLDER_URL);
    write_file(&placeholder_path, &placeholder_png()?)?;
    written.push(placeholder_path);

    let favicon = layout.source_root.join("favicon.ico");
    if favicon.is_file() {
        let dest = layout.output_root.join("favicon.ico");
        fs::copy(&favicon, &dest).map_err(|e| RenderError::io(&favicon, e))?;
        written.push(dest);
    }
    Ok(written)
}

/// Filesystem path of an absolute site URL.
fn site_file(output_root: &Path, url: &str) -> PathBuf {
    output_root.join(url.trim_start_matches('/'))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| RenderError::io(path, e))
}

/// Flat grey square shown for galleries without photos.
fn placeholder_png() -> Result<Vec<u8>, image::ImageError> {
    let img = image::RgbImage::from_pixel(PLACEHOLDER_EDGE, PLACEHOLDER_EDGE, image::Rgb([221, 221, 221]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// ============================================================================
// Tests
// ============================================================================
