//! Extension entity
//!
//! One logical extension, merged from an installed record, a gallery
//! record, or both. Entities are owned by the service and addressed by
//! [`EntityHandle`]; every reader sees the same handle for the same
//! installed extension across refreshes.

use crate::traits::GallerySource;
use serde::{Deserialize, Serialize};
use skald_core::error::{Error, Result};
use skald_core::types::{
    canonical_id, ExtensionIdentifier, ExtensionManifest, ExtensionType, GalleryExtension,
    LocalExtension,
};
use skald_core::version;
use url::Url;

/// Icon shown when neither facet provides one
pub const DEFAULT_ICON_URL: &str = "skald://assets/default-extension-icon.svg";

/// Stable identity of an entity within one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(u64);

impl EntityHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Which records back an entity. At least one is always present.
#[derive(Debug, Clone, PartialEq)]
pub enum Facets {
    Local(LocalExtension),
    Gallery(GalleryExtension),
    Both {
        local: LocalExtension,
        gallery: GalleryExtension,
    },
}

impl Facets {
    pub fn local(&self) -> Option<&LocalExtension> {
        match self {
            Self::Local(local) | Self::Both { local, .. } => Some(local),
            Self::Gallery(_) => None,
        }
    }

    pub fn gallery(&self) -> Option<&GalleryExtension> {
        match self {
            Self::Gallery(gallery) | Self::Both { gallery, .. } => Some(gallery),
            Self::Local(_) => None,
        }
    }
}

/// Identity fields reported with telemetry events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryData {
    pub id: String,
    pub name: String,
    pub gallery_id: Option<String>,
    pub publisher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_display_name: Option<String>,
    pub dependencies: bool,
}

/// A merged view of one extension
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionEntity {
    handle: EntityHandle,
    facets: Facets,
    disabled_globally: bool,
    disabled_for_workspace: bool,
}

impl ExtensionEntity {
    pub(crate) fn new(handle: EntityHandle, facets: Facets) -> Self {
        Self {
            handle,
            facets,
            disabled_globally: false,
            disabled_for_workspace: false,
        }
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn local(&self) -> Option<&LocalExtension> {
        self.facets.local()
    }

    pub fn gallery(&self) -> Option<&GalleryExtension> {
        self.facets.gallery()
    }

    /// Replace (or attach) the installed record
    pub(crate) fn set_local(&mut self, local: LocalExtension) {
        self.facets = match &self.facets {
            Facets::Local(_) => Facets::Local(local),
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => Facets::Both {
                local,
                gallery: gallery.clone(),
            },
        };
    }

    /// Replace (or attach) the gallery record
    pub(crate) fn set_gallery(&mut self, gallery: GalleryExtension) {
        self.facets = match &self.facets {
            Facets::Gallery(_) => Facets::Gallery(gallery),
            Facets::Local(local) | Facets::Both { local, .. } => Facets::Both {
                local: local.clone(),
                gallery,
            },
        };
    }

    pub(crate) fn set_disabled(&mut self, globally: bool, for_workspace: bool) {
        self.disabled_globally = globally;
        self.disabled_for_workspace = for_workspace;
    }

    pub fn kind(&self) -> ExtensionType {
        self.local().map(|l| l.kind).unwrap_or_default()
    }

    pub fn is_system(&self) -> bool {
        self.kind() == ExtensionType::System
    }

    /// Canonical `<publisher>.<name>`; the gallery's wins when present
    pub fn id(&self) -> String {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => {
                canonical_id(&gallery.identifier.id)
            }
            Facets::Local(local) => canonical_id(&local.identifier.id),
        }
    }

    pub fn uuid(&self) -> Option<String> {
        if let Some(uuid) = self.gallery().and_then(|g| g.identifier.uuid.clone()) {
            return Some(uuid);
        }
        let local = self.local()?;
        local.identifier.uuid.clone().or_else(|| {
            local
                .metadata
                .as_ref()
                .and_then(|m| m.gallery_uuid.clone())
        })
    }

    pub fn identifier(&self) -> ExtensionIdentifier {
        ExtensionIdentifier {
            id: self.id(),
            uuid: self.uuid(),
        }
    }

    /// Whether two entities describe the same extension
    pub fn same_extension(&self, other: &ExtensionEntity) -> bool {
        self.identifier().matches(&other.identifier())
    }

    pub fn name(&self) -> String {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => gallery.name.clone(),
            Facets::Local(local) => local.manifest.name.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => gallery
                .display_name
                .clone()
                .unwrap_or_else(|| gallery.name.clone()),
            Facets::Local(local) => local
                .manifest
                .display_name
                .clone()
                .unwrap_or_else(|| local.manifest.name.clone()),
        }
    }

    pub fn publisher(&self) -> String {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => gallery.publisher.clone(),
            Facets::Local(local) => local.manifest.publisher.clone(),
        }
    }

    pub fn publisher_display_name(&self) -> String {
        self.gallery()
            .and_then(|g| g.publisher_display_name.clone())
            .unwrap_or_else(|| self.publisher())
    }

    /// Installed version, else the gallery version
    pub fn version(&self) -> String {
        match &self.facets {
            Facets::Local(local) | Facets::Both { local, .. } => local.manifest.version.clone(),
            Facets::Gallery(gallery) => gallery.version.clone(),
        }
    }

    /// Gallery version, else the installed version
    pub fn latest_version(&self) -> String {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => gallery.version.clone(),
            Facets::Local(local) => local.manifest.version.clone(),
        }
    }

    pub fn description(&self) -> Option<String> {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => gallery.description.clone(),
            Facets::Local(local) => local.manifest.description.clone(),
        }
    }

    /// A user extension whose gallery version is newer than the installed one
    pub fn outdated(&self) -> bool {
        match &self.facets {
            Facets::Both { local, gallery } => {
                local.kind == ExtensionType::User
                    && version::is_newer(&gallery.version, &local.manifest.version)
            }
            _ => false,
        }
    }

    /// Declared dependency ids. The installed manifest is authoritative.
    pub fn dependencies(&self) -> Vec<String> {
        match &self.facets {
            Facets::Local(local) | Facets::Both { local, .. } => {
                local.manifest.extension_dependencies.clone()
            }
            Facets::Gallery(gallery) => gallery.properties.dependencies.clone(),
        }
    }

    pub fn icon_url(&self) -> String {
        if let Some(local) = self.local() {
            if let Some(icon) = &local.manifest.icon {
                if let Ok(url) = Url::from_file_path(local.location.join(icon)) {
                    return url.to_string();
                }
            }
        }
        self.gallery()
            .and_then(|g| g.assets.icon.as_ref())
            .map(|asset| asset.uri.clone())
            .unwrap_or_else(|| DEFAULT_ICON_URL.to_string())
    }

    pub fn license_url(&self) -> Option<String> {
        self.gallery()
            .and_then(|g| g.assets.license.as_ref())
            .map(|asset| asset.uri.clone())
    }

    pub fn install_count(&self) -> Option<u64> {
        self.gallery().map(|g| g.install_count)
    }

    pub fn rating(&self) -> Option<f32> {
        self.gallery().map(|g| g.rating)
    }

    pub fn rating_count(&self) -> Option<u32> {
        self.gallery().map(|g| g.rating_count)
    }

    pub fn has_changelog(&self) -> bool {
        self.gallery()
            .is_some_and(|g| g.assets.changelog.is_some())
            || self.local().is_some_and(|l| l.changelog_url.is_some())
    }

    pub fn disabled_globally(&self) -> bool {
        self.disabled_globally
    }

    pub fn disabled_for_workspace(&self) -> bool {
        self.disabled_for_workspace
    }

    /// Whether the extension is disabled in the given scope
    pub fn disabled_in(&self, workspace: bool) -> bool {
        if workspace {
            self.disabled_for_workspace
        } else {
            self.disabled_globally
        }
    }

    /// Enabled means disabled in neither scope
    pub fn is_enabled(&self) -> bool {
        !self.disabled_globally && !self.disabled_for_workspace
    }

    pub fn telemetry_data(&self) -> TelemetryData {
        match &self.facets {
            Facets::Gallery(gallery) | Facets::Both { gallery, .. } => TelemetryData {
                id: canonical_id(&gallery.identifier.id),
                name: gallery.name.clone(),
                gallery_id: gallery.identifier.uuid.clone(),
                publisher_name: gallery.publisher.clone(),
                publisher_display_name: gallery.publisher_display_name.clone(),
                dependencies: !gallery.properties.dependencies.is_empty(),
            },
            Facets::Local(local) => TelemetryData {
                id: canonical_id(&local.identifier.id),
                name: local.manifest.name.clone(),
                gallery_id: None,
                publisher_name: local.manifest.publisher.clone(),
                publisher_display_name: None,
                dependencies: !local.manifest.extension_dependencies.is_empty(),
            },
        }
    }

    /// Package manifest; the installed one when present, else fetched
    pub async fn manifest(&self, gallery: &dyn GallerySource) -> Result<ExtensionManifest> {
        match &self.facets {
            Facets::Local(local) | Facets::Both { local, .. } => Ok(local.manifest.clone()),
            Facets::Gallery(record) => Ok(gallery.manifest(record).await?),
        }
    }

    pub async fn readme(&self, gallery: &dyn GallerySource) -> Result<String> {
        if let Some(record) = self.gallery().filter(|g| g.assets.readme.is_some()) {
            return Ok(gallery.readme(record).await?);
        }
        let url = self.local().and_then(|l| l.readme_url.as_deref());
        self.read_local_asset(url, "Readme").await
    }

    pub async fn changelog(&self, gallery: &dyn GallerySource) -> Result<String> {
        if let Some(record) = self.gallery().filter(|g| g.assets.changelog.is_some()) {
            return Ok(gallery.changelog(record).await?);
        }
        let url = self.local().and_then(|l| l.changelog_url.as_deref());
        self.read_local_asset(url, "Changelog").await
    }

    async fn read_local_asset(&self, url: Option<&str>, resource: &str) -> Result<String> {
        let path = url
            .and_then(|u| Url::parse(u).ok())
            .filter(|u| u.scheme() == "file")
            .and_then(|u| u.to_file_path().ok());

        match path {
            Some(path) => Ok(tokio::fs::read_to_string(path).await?),
            None => Err(Error::not_available(self.id(), resource)),
        }
    }
}
