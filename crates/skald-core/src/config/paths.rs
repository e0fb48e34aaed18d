//! Data directory layout
//!
//! ```text
//! ~/.skald/
//!   settings.yaml        service settings overlay
//!   manifest.yaml        installed extensions
//!   enablement.yaml      globally / per-workspace disabled ids
//!   registry.yaml        gallery registry
//!   telemetry.jsonl      telemetry ledger
//!   extensions/          one directory per installed extension
//! ```

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;

/// Resolved locations of Skald's files
#[derive(Debug, Clone)]
pub struct SkaldPaths {
    root: Utf8PathBuf,
}

impl SkaldPaths {
    /// Resolve from `SKALD_HOME`, falling back to `~/.skald`
    pub fn resolve() -> Result<Self> {
        if let Ok(home) = env::var("SKALD_HOME") {
            return Ok(Self::with_root(home));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::try_from(home)
            .map_err(|_| Error::invalid_config("Home directory path is not valid UTF-8"))?;
        Ok(Self::with_root(home.join(".skald")))
    }

    /// Use an explicit root directory
    pub fn with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root and extensions directories
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(self.extensions_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join("manifest.yaml")
    }

    pub fn enablement_path(&self) -> Utf8PathBuf {
        self.root.join("enablement.yaml")
    }

    pub fn registry_path(&self) -> Utf8PathBuf {
        self.root.join("registry.yaml")
    }

    pub fn ledger_path(&self) -> Utf8PathBuf {
        self.root.join("telemetry.jsonl")
    }

    pub fn extensions_dir(&self) -> Utf8PathBuf {
        self.root.join("extensions")
    }
}
