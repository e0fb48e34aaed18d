//! Hierarchical settings loader with precedence
//!
//! Loads settings from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Global settings (~/.skald/settings.yaml)
//! 3. Environment variables (SKALD_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{ExtensionsSettings, SettingsOverlay};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "settings-defaults.yaml";
const SETTINGS_FILE: &str = "settings.yaml";

/// Settings hierarchy loader
pub struct SettingsLoader {
    /// Directory holding settings.yaml
    config_dir: Utf8PathBuf,
}

impl SettingsLoader {
    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Path of the global settings file
    pub fn settings_path(&self) -> Utf8PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Load settings with hierarchical precedence
    pub fn load(&self) -> Result<ExtensionsSettings> {
        let mut settings = Self::load_embedded_defaults()?;

        let path = self.settings_path();
        if path.exists() {
            debug!("Loading settings from {}", path);
            let overlay = Self::load_overlay(&path)?;
            settings = Self::merge(settings, overlay);
        }

        Self::apply_env_overrides(settings)
    }

    fn load_embedded_defaults() -> Result<ExtensionsSettings> {
        let embedded = EmbeddedConfigs::get(DEFAULTS_FILE).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", DEFAULTS_FILE))
        })?;

        let content = std::str::from_utf8(&embedded.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", DEFAULTS_FILE))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                DEFAULTS_FILE, e
            ))
        })
    }

    fn load_overlay(path: &Utf8Path) -> Result<SettingsOverlay> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(SettingsOverlay::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge an overlay onto base settings (set keys win)
    pub fn merge(mut base: ExtensionsSettings, overlay: SettingsOverlay) -> ExtensionsSettings {
        if let Some(v) = overlay.auto_update {
            base.auto_update = v;
        }
        if let Some(v) = overlay.sync_interval_secs {
            base.sync_interval_secs = v;
        }
        if let Some(v) = overlay.auto_update_delay_ms {
            base.auto_update_delay_ms = v;
        }
        if let Some(v) = overlay.gallery_page_size {
            base.gallery_page_size = v;
        }
        base
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut settings: ExtensionsSettings) -> Result<ExtensionsSettings> {
        if let Ok(val) = env::var("SKALD_AUTO_UPDATE") {
            settings.auto_update = parse_bool(&val).ok_or_else(|| {
                Error::invalid_config("SKALD_AUTO_UPDATE must be true or false")
            })?;
        }

        if let Ok(val) = env::var("SKALD_SYNC_INTERVAL_SECS") {
            settings.sync_interval_secs = val.parse().map_err(|_| {
                Error::invalid_config("SKALD_SYNC_INTERVAL_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("SKALD_AUTO_UPDATE_DELAY_MS") {
            settings.auto_update_delay_ms = val.parse().map_err(|_| {
                Error::invalid_config("SKALD_AUTO_UPDATE_DELAY_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("SKALD_GALLERY_PAGE_SIZE") {
            settings.gallery_page_size = val.parse().map_err(|_| {
                Error::invalid_config("SKALD_GALLERY_PAGE_SIZE must be a valid number")
            })?;
        }

        if settings.gallery_page_size == 0 {
            return Err(Error::invalid_config("gallery-page-size must be positive"));
        }

        Ok(settings)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
