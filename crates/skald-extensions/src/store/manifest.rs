//! Installed-extension inventory
//!
//! Installed extensions are tracked in `~/.skald/manifest.yaml`; each one
//! is unpacked into its own directory under `~/.skald/extensions/`.
//!
//! ```yaml
//! schema-version: "1.0"
//! last-updated: "2026-03-02T10:00:00Z"
//! extensions:
//!   ms-python.python:
//!     identifier: { id: ms-python.python }
//!     type: user
//!     location: /home/me/.skald/extensions/ms-python.python-2024.2.0
//!     manifest: { name: python, publisher: ms-python, version: 2024.2.0 }
//! ```

use super::file_url;
use crate::traits::{GallerySource, InstallTarget, InventoryEvent, LocalInventory};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skald_core::error::Error;
use skald_core::types::{
    ExtensionIdentifier, ExtensionManifest, ExtensionType, GalleryExtension, InstallMetadata,
    InstallOrigin, LocalExtension,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Package manifest file name inside an extension directory
pub const PACKAGE_MANIFEST_FILE: &str = "extension.yaml";

const README_FILE: &str = "README.md";
const CHANGELOG_FILE: &str = "CHANGELOG.md";
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct InstalledManifest {
    #[serde(default = "default_schema_version")]
    schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    extensions: BTreeMap<String, LocalExtension>,
}

impl Default for InstalledManifest {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            last_updated: None,
            extensions: BTreeMap::new(),
        }
    }
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

fn error_code(error: &anyhow::Error) -> String {
    format!("{:#}", error)
}

/// Inventory backed by a manifest file and an extensions directory
pub struct ManifestInventory {
    manifest_path: Utf8PathBuf,
    extensions_dir: Utf8PathBuf,
    gallery: Arc<dyn GallerySource>,
    events: broadcast::Sender<InventoryEvent>,
    /// Serializes read-modify-write cycles on the manifest
    write_lock: Mutex<()>,
}

impl ManifestInventory {
    pub fn new(
        manifest_path: impl Into<Utf8PathBuf>,
        extensions_dir: impl Into<Utf8PathBuf>,
        gallery: Arc<dyn GallerySource>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            manifest_path: manifest_path.into(),
            extensions_dir: extensions_dir.into(),
            gallery,
            events,
            write_lock: Mutex::new(()),
        }
    }

    fn emit(&self, event: InventoryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    async fn load(&self) -> Result<InstalledManifest> {
        if !self.manifest_path.exists() {
            return Ok(InstalledManifest::default());
        }
        let content = tokio::fs::read_to_string(&self.manifest_path)
            .await
            .with_context(|| format!("Failed to read {}", self.manifest_path))?;
        if content.trim().is_empty() {
            return Ok(InstalledManifest::default());
        }
        let manifest: InstalledManifest = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.manifest_path))?;
        debug!(
            "Loaded manifest with {} extensions",
            manifest.extensions.len()
        );
        Ok(manifest)
    }

    async fn save(&self, manifest: &mut InstalledManifest) -> Result<()> {
        manifest.last_updated = Some(Utc::now());
        if let Some(parent) = self.manifest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_yaml_ng::to_string(manifest)?;
        tokio::fs::write(&self.manifest_path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.manifest_path))?;
        debug!(
            "Saved manifest with {} extensions",
            manifest.extensions.len()
        );
        Ok(())
    }

    /// Record an installed extension, replacing (and cleaning up) any
    /// previously installed version
    async fn record(&self, local: &LocalExtension) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut manifest = self.load().await?;

        let previous = manifest
            .extensions
            .insert(local.identifier.id.clone(), local.clone());
        if let Some(previous) = previous.filter(|p| p.location != local.location) {
            if let Err(e) = tokio::fs::remove_dir_all(&previous.location).await {
                warn!("Failed to remove {}: {}", previous.location, e);
            }
        }

        self.save(&mut manifest).await
    }

    fn install_dir(&self, manifest: &ExtensionManifest) -> Utf8PathBuf {
        self.extensions_dir
            .join(format!("{}-{}", manifest.id(), manifest.version))
    }

    async fn write_manifest(dir: &Utf8Path, manifest: &ExtensionManifest) -> Result<()> {
        let content = serde_yaml_ng::to_string(manifest)?;
        tokio::fs::write(dir.join(PACKAGE_MANIFEST_FILE), content).await?;
        Ok(())
    }

    async fn unpack_gallery(&self, record: &GalleryExtension) -> Result<LocalExtension> {
        let manifest = self
            .gallery
            .manifest(record)
            .await
            .with_context(|| format!("Failed to fetch manifest of {}", record.identifier))?;

        let dir = self.install_dir(&manifest);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir))?;
        Self::write_manifest(&dir, &manifest).await?;

        let readme_url = match &record.assets.readme {
            Some(_) => {
                let content = self.gallery.readme(record).await?;
                let path = dir.join(README_FILE);
                tokio::fs::write(&path, content).await?;
                Some(file_url(&path)?)
            }
            None => None,
        };
        let changelog_url = match &record.assets.changelog {
            Some(_) => {
                let content = self.gallery.changelog(record).await?;
                let path = dir.join(CHANGELOG_FILE);
                tokio::fs::write(&path, content).await?;
                Some(file_url(&path)?)
            }
            None => None,
        };

        let local = LocalExtension {
            identifier: ExtensionIdentifier::new(&record.identifier.id),
            kind: ExtensionType::User,
            location: dir,
            manifest,
            metadata: Some(InstallMetadata {
                installed_at: Utc::now(),
                origin: InstallOrigin::Gallery,
                gallery_uuid: record.identifier.uuid.clone(),
            }),
            readme_url,
            changelog_url,
        };
        self.record(&local).await?;
        Ok(local)
    }

    async fn unpack_package(&self, path: &Utf8Path) -> Result<LocalExtension> {
        let (source_dir, manifest_path) = if path.is_dir() {
            (path.to_path_buf(), path.join(PACKAGE_MANIFEST_FILE))
        } else {
            let parent = path.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
            (parent, path.to_path_buf())
        };

        let content = tokio::fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("Failed to read package manifest {}", manifest_path))?;
        let manifest: ExtensionManifest = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse package manifest {}", manifest_path))?;
        ExtensionIdentifier::parse(&manifest.id())?;

        let dir = self.install_dir(&manifest);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir))?;
        Self::write_manifest(&dir, &manifest).await?;

        let mut urls = [None, None];
        for (slot, file) in urls.iter_mut().zip([README_FILE, CHANGELOG_FILE]) {
            let source = source_dir.join(file);
            if source.exists() {
                let target = dir.join(file);
                tokio::fs::copy(&source, &target).await?;
                *slot = Some(file_url(&target)?);
            }
        }
        let [readme_url, changelog_url] = urls;

        let local = LocalExtension {
            identifier: manifest.identifier(),
            kind: ExtensionType::User,
            location: dir,
            manifest,
            metadata: Some(InstallMetadata {
                installed_at: Utc::now(),
                origin: InstallOrigin::Package,
                gallery_uuid: None,
            }),
            readme_url,
            changelog_url,
        };
        self.record(&local).await?;
        Ok(local)
    }

    async fn remove(&self, local: &LocalExtension) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut manifest = self.load().await?;

        let key = manifest
            .extensions
            .keys()
            .find(|k| local.identifier.matches_id(k))
            .cloned()
            .ok_or_else(|| Error::unknown_extension(local.identifier.id.clone()))?;
        let removed = manifest.extensions.remove(&key);
        self.save(&mut manifest).await?;

        if let Some(removed) = removed {
            if removed.location.exists() {
                tokio::fs::remove_dir_all(&removed.location)
                    .await
                    .with_context(|| format!("Failed to remove {}", removed.location))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocalInventory for ManifestInventory {
    async fn list_installed(&self) -> Result<Vec<LocalExtension>> {
        Ok(self.load().await?.extensions.into_values().collect())
    }

    async fn install_from_gallery(&self, gallery: &GalleryExtension) -> Result<LocalExtension> {
        let target = InstallTarget::Gallery(gallery.clone());
        self.emit(InventoryEvent::InstallStarted {
            target: target.clone(),
        });

        let result = self.unpack_gallery(gallery).await;
        match &result {
            Ok(local) => info!("Installed {} v{}", local.identifier, local.manifest.version),
            Err(e) => warn!("Install of {} failed: {:#}", gallery.identifier, e),
        }

        self.emit(InventoryEvent::InstallCompleted {
            target,
            outcome: result.as_ref().map(Clone::clone).map_err(error_code),
        });
        result
    }

    async fn install_package(&self, path: &Utf8Path) -> Result<LocalExtension> {
        let target = InstallTarget::Package(path.to_path_buf());
        self.emit(InventoryEvent::InstallStarted {
            target: target.clone(),
        });

        let result = self.unpack_package(path).await;
        self.emit(InventoryEvent::InstallCompleted {
            target,
            outcome: result.as_ref().map(Clone::clone).map_err(error_code),
        });
        result
    }

    async fn uninstall(&self, local: &LocalExtension) -> Result<()> {
        if local.kind == ExtensionType::System {
            bail!("Cannot uninstall system extension {}", local.identifier);
        }

        let identifier = local.identifier.clone();
        self.emit(InventoryEvent::UninstallStarted {
            identifier: identifier.clone(),
        });

        let result = self.remove(local).await;
        if result.is_ok() {
            info!("Uninstalled {}", identifier);
        }

        self.emit(InventoryEvent::UninstallCompleted {
            identifier,
            error: result.as_ref().err().map(error_code),
        });
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.events.subscribe()
    }
}
