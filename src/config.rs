//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` found at the
//! root of the source tree. Stock defaults are the base layer; the user file is
//! merged on top, so it only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Photo Gallery"      # Site title, used in every page title
//! description = ""             # <meta name="description">
//! footer_html = ""             # Raw HTML placed in every page footer
//! show_created_date = true     # "Taken Mon D, YYYY" line in captions
//! top_level_name = "gallery"   # Folder whose page becomes the site root
//!
//! [variants.large]
//! width = 2400
//! quality = 88
//!
//! [variants.medium]
//! width = 800
//! quality = 88
//!
//! [variants.thumb]
//! width = 200
//! quality = 80
//!
//! [processing]
//! max_processes = 4            # Max parallel resize workers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::Tier;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title. Gallery pages are titled `<Gallery> - <title>`.
    pub title: String,
    pub description: String,
    /// Inserted unescaped into every page footer.
    pub footer_html: String,
    /// Add the capture date line to image captions.
    pub show_created_date: bool,
    /// Name of the folder (directly under the source root) holding all galleries.
    pub top_level_name: String,
    pub variants: VariantsConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Photo Gallery".to_string(),
            description: String::new(),
            footer_html: String::new(),
            show_created_date: true,
            top_level_name: "gallery".to_string(),
            variants: VariantsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_level_name.is_empty()
            || self.top_level_name.contains(['/', '\\'])
            || self.top_level_name.starts_with('.')
        {
            return Err(ConfigError::Validation(
                "top_level_name must be a plain folder name".into(),
            ));
        }
        for tier in Tier::ALL {
            let settings = self.variants.get(tier);
            if settings.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "variants.{}.width must be non-zero",
                    VariantsConfig::key(tier)
                )));
            }
            if settings.quality == 0 || settings.quality > 100 {
                return Err(ConfigError::Validation(format!(
                    "variants.{}.quality must be 1-100",
                    VariantsConfig::key(tier)
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Bounding box and JPEG quality of one size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Longest edge in pixels; images are fit inside a `width`×`width` box.
    pub width: u32,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    pub large: TierConfig,
    pub medium: TierConfig,
    pub thumb: TierConfig,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            large: TierConfig {
                width: 2400,
                quality: 88,
            },
            medium: TierConfig {
                width: 800,
                quality: 88,
            },
            thumb: TierConfig {
                width: 200,
                quality: 80,
            },
        }
    }
}

impl VariantsConfig {
    pub fn get(&self, tier: Tier) -> TierConfig {
        match tier {
            Tier::Large => self.large,
            Tier::Medium => self.medium,
            Tier::Thumb => self.thumb,
        }
    }

    fn key(tier: Tier) -> &'static str {
        match tier {
            Tier::Large => "large",
            Tier::Medium => "medium",
            Tier::Thumb => "thumb",
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from `config.toml` in the given directory.
///
/// A missing file yields the stock defaults. User values are merged on top of
/// the defaults, unknown keys are rejected, and the result is validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join("config.toml");
    let mut merged = stock_defaults_value()?;
    if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merged = merge_toml(merged, overlay);
    }
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Forge Configuration
# ===========================
# Place this file at the root of the source tree as config.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Site title. Gallery pages are titled "<Gallery> - <title>".
title = "Photo Gallery"

# Content of <meta name="description">.
description = ""

# Raw HTML inserted into every page footer (not escaped).
footer_html = ""

# Show "Taken Mon D, YYYY" in image captions when a capture date is known.
show_created_date = true

# Folder directly under the source root that holds every gallery.
# Its page is written to the root of the output.
top_level_name = "gallery"

# ---------------------------------------------------------------------------
# Derived image sizes
# ---------------------------------------------------------------------------
# Images are fit inside a width x width box and never enlarged.
[variants.large]
width = 2400
quality = 88

[variants.medium]
width = 800
quality = 88

[variants.thumb]
width = 200
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
