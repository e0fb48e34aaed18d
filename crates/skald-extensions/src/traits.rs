//! Collaborator trait definitions
//!
//! The service owns no storage of its own. Installed records, gallery
//! lookups, enablement flags, prompts and telemetry all come through
//! these seams.

use crate::events::TelemetryEvent;
use anyhow::Result;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use skald_core::types::{
    EnablementScope, ExtensionIdentifier, ExtensionManifest, GalleryExtension, LocalExtension,
};
use tokio::sync::broadcast;

/// What an install was started from
#[derive(Debug, Clone, PartialEq)]
pub enum InstallTarget {
    /// A gallery record
    Gallery(GalleryExtension),
    /// A package on disk
    Package(Utf8PathBuf),
}

/// Lifecycle events broadcast by the local inventory
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryEvent {
    InstallStarted {
        target: InstallTarget,
    },
    InstallCompleted {
        target: InstallTarget,
        /// Installed record, or the error code on failure
        outcome: std::result::Result<LocalExtension, String>,
    },
    UninstallStarted {
        identifier: ExtensionIdentifier,
    },
    UninstallCompleted {
        identifier: ExtensionIdentifier,
        /// Error code on failure
        error: Option<String>,
    },
}

/// Installed-extension inventory
#[async_trait]
pub trait LocalInventory: Send + Sync {
    /// All installed extensions, system and user
    async fn list_installed(&self) -> Result<Vec<LocalExtension>>;

    /// Install (or update to) a gallery version
    async fn install_from_gallery(&self, gallery: &GalleryExtension) -> Result<LocalExtension>;

    /// Install from a package on disk
    async fn install_package(&self, path: &Utf8Path) -> Result<LocalExtension>;

    /// Remove an installed extension
    async fn uninstall(&self, local: &LocalExtension) -> Result<()>;

    /// Subscribe to lifecycle events
    fn subscribe(&self) -> broadcast::Receiver<InventoryEvent>;
}

/// Gallery search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    /// Free-text filter
    pub text: Option<String>,
    /// Restrict to these gallery uuids
    pub ids: Vec<String>,
    /// Restrict to these `<publisher>.<name>` ids
    pub names: Vec<String>,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl GalleryQuery {
    pub fn text(text: impl Into<String>, page_size: usize) -> Self {
        Self {
            text: Some(text.into()),
            page_size,
            ..Default::default()
        }
    }

    pub fn by_uuids(ids: Vec<String>) -> Self {
        Self {
            page_size: ids.len(),
            ids,
            ..Default::default()
        }
    }

    pub fn by_names(names: Vec<String>) -> Self {
        Self {
            page_size: names.len(),
            names,
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// One page of gallery results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryPage {
    /// Total matches across all pages
    pub total: usize,
    pub items: Vec<GalleryExtension>,
}

/// Remote (or registry-backed) extension gallery
#[async_trait]
pub trait GallerySource: Send + Sync {
    async fn query(&self, query: &GalleryQuery) -> Result<GalleryPage>;

    /// Package manifest of a gallery version
    async fn manifest(&self, extension: &GalleryExtension) -> Result<ExtensionManifest>;

    async fn readme(&self, extension: &GalleryExtension) -> Result<String>;

    async fn changelog(&self, extension: &GalleryExtension) -> Result<String>;

    /// Transitive dependency records, excluding the extension itself
    async fn all_dependencies(&self, extension: &GalleryExtension)
        -> Result<Vec<GalleryExtension>>;

    /// Newest version compatible with the running host, if any
    async fn load_compatible_version(
        &self,
        extension: &GalleryExtension,
    ) -> Result<Option<GalleryExtension>>;
}

/// Persisted enablement flags
#[async_trait]
pub trait EnablementStore: Send + Sync {
    fn globally_disabled(&self) -> Vec<ExtensionIdentifier>;

    fn workspace_disabled(&self) -> Vec<ExtensionIdentifier>;

    /// Write one flag; returns whether anything changed
    async fn set_enablement(
        &self,
        identifier: &ExtensionIdentifier,
        enable: bool,
        scope: EnablementScope,
    ) -> Result<bool>;

    /// Identifiers whose enablement changed
    fn subscribe(&self) -> broadcast::Receiver<ExtensionIdentifier>;
}

/// Prompt severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-facing prompts and error surfacing
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the user to pick one option. `None` means the prompt was dismissed.
    async fn choose(
        &self,
        severity: Severity,
        message: &str,
        options: &[&str],
        default: usize,
    ) -> Option<usize>;

    fn show_error(&self, message: &str);
}

/// Telemetry event sink. Implementations must not fail the caller.
pub trait TelemetrySink: Send + Sync {
    fn log(&self, event: TelemetryEvent);
}

/// Static companion-extension table
pub trait CompanionLookup: Send + Sync {
    /// Ids recommended alongside `id`
    fn companions(&self, id: &str) -> Vec<String>;
}
