use clap::{Parser, Subcommand};
use gallery_forge::config::{self, SiteConfig};
use gallery_forge::generate::{self, SiteLayout};
use gallery_forge::manifest::{self, BuildOptions, GalleryNode};
use gallery_forge::outcome::{ErrorRecord, Outcome};
use gallery_forge::tags::TagIndex;
use gallery_forge::{logging, output, process};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gallery-forge")]
#[command(about = "Static photo gallery generator driven by folders")]
#[command(long_about = "\
Static photo gallery generator driven by folders

Every folder under the top-level gallery folder becomes a gallery page.
Subfolders are listed before photos; dated folders sort newest first.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── favicon.ico                  # Copied to the output root (optional)
  └── gallery/                     # Top-level gallery (name set by top_level_name)
      ├── gallery.json             # {\"tags\": [\"travel\"]} (optional)
      ├── 2023-06_Paris/
      │   ├── gallery.json
      │   ├── cover.jpg            # Chosen as the gallery's cover
      │   └── eiffel.jpg
      └── 2022_Rome/
          └── forum.jpg

Output structure:

  build/
  ├── index.html                   # Top-level gallery page
  ├── static/                      # Stylesheet and placeholder image
  └── gallery/
      ├── index.json               # Manifest of the top-level gallery
      ├── tag_travel.html
      └── 2023-06_Paris/
          ├── index.html
          ├── index.json
          └── large/ medium/ thumbs/

Photo metadata:
  Title:       XMP title, else \"<Gallery> - <file stem>\"
  Description: XMP description
  Date:        EXIF DateTimeOriginal, shown as \"Taken Jun 15, 2023\"
  Location:    EXIF GPS

Run 'gallery-forge gen-config' to generate a documented config.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "build", global = true)]
    output: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the large, medium and thumbs tiers of every photo
    Resize,
    /// Build index.json for every gallery in the output tree
    Manifest,
    /// Print the tag index as JSON
    Tags,
    /// Build manifests, then write pages and assets
    Html,
    /// Run the full pipeline: clean → resize → manifest → html
    Build,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let load = || -> Result<(SiteConfig, SiteLayout), config::ConfigError> {
        let site = config::load_config(&cli.source)?;
        let layout = SiteLayout::new(&cli.source, &cli.output, &site);
        Ok((site, layout))
    };

    match cli.command {
        Command::Resize => {
            let (site, layout) = load()?;
            init_thread_pool(&site.processing);
            let errors = resize(&cli.source, &layout, &site)?;
            output::print_error_summary(&errors);
        }
        Command::Manifest => {
            let (site, layout) = load()?;
            let built = build_manifests(&layout, &site)?;
            output::print_manifest_tree(&built.value);
            output::print_error_summary(&built.errors);
        }
        Command::Tags => {
            let (_, layout) = load()?;
            let index = TagIndex::collect(&layout.gallery_root).value;
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
        Command::Html => {
            let (site, layout) = load()?;
            let errors = html(&layout, &site)?;
            output::print_error_summary(&errors);
        }
        Command::Build => {
            let (site, layout) = load()?;
            init_thread_pool(&site.processing);
            process::clean_output(&cli.output, &cli.source)?;

            println!("==> Stage 1: Resizing photos");
            let mut errors = resize(&cli.source, &layout, &site)?;

            println!("==> Stage 2: Generating HTML \u{2192} {}", cli.output.display());
            errors.extend(html(&layout, &site)?);

            println!("==> Build complete: {}", cli.output.display());
            output::print_error_summary(&errors);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Mirror the source galleries into the output tree, printing progress.
fn resize(
    source: &Path,
    layout: &SiteLayout,
    site: &SiteConfig,
) -> Result<Vec<ErrorRecord>, Box<dyn std::error::Error>> {
    let source_gallery = source.join(&site.top_level_name);
    let (tx, rx) = std::sync::mpsc::channel();
    let printer_root = source.to_path_buf();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_resize_event(&event, &printer_root) {
                println!("{}", line);
            }
        }
    });
    let result = process::resize_tree(&source_gallery, &layout.gallery_root, &site.variants, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer panicked")?;
    let outcome = result?;
    output::print_resize_summary(&outcome.value);
    Ok(outcome.errors)
}

fn build_manifests(
    layout: &SiteLayout,
    site: &SiteConfig,
) -> Result<Outcome<GalleryNode>, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let options = BuildOptions::from(site);
    Ok(runtime.block_on(manifest::build_manifests(&layout.gallery_root, &options))?)
}

/// Manifests, tag index, then every page and asset.
fn html(layout: &SiteLayout, site: &SiteConfig) -> Result<Vec<ErrorRecord>, Box<dyn std::error::Error>> {
    let mut errors = Vec::new();
    let tree = build_manifests(layout, site)?.merge_into(&mut errors);
    output::print_manifest_tree(&tree);

    let index = TagIndex::collect(&layout.gallery_root).merge_into(&mut errors);
    let rendered = generate::render_site(&tree, &index, layout, site)?.merge_into(&mut errors);
    output::print_render_summary(&rendered, &layout.output_root);
    Ok(errors)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
