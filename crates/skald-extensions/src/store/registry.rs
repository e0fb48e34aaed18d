//! Registry-backed gallery
//!
//! Reads a YAML registry listing every published version of every
//! extension. Assets (manifest, readme, changelog) are files referenced
//! relative to the registry's directory, or `file://` URLs.
//!
//! ```yaml
//! extensions:
//!   - identifier: { id: ms-python.python, uuid: f1f59ae4 }
//!     name: python
//!     publisher: ms-python
//!     version: "2024.2.0"
//!     assets:
//!       readme: { uri: assets/python/README.md }
//!     properties:
//!       dependencies: [ms-python.vscode-pylance]
//!       engine: "^0.4"
//! companions:
//!   ms-python.python: [ms-toolsai.jupyter]
//! ```

use crate::traits::{CompanionLookup, GalleryPage, GalleryQuery, GallerySource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use skald_core::error::Error;
use skald_core::types::{canonical_id, ExtensionManifest, GalleryAsset, GalleryExtension};
use skald_core::version::parse_lenient;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};
use url::Url;

/// On-disk registry format
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryFile {
    #[serde(default)]
    pub extensions: Vec<GalleryExtension>,

    /// Companion recommendations keyed by extension id
    #[serde(default)]
    pub companions: BTreeMap<String, Vec<String>>,
}

/// Package manifest implied by a gallery record without a manifest asset
pub fn manifest_from_record(record: &GalleryExtension) -> ExtensionManifest {
    ExtensionManifest {
        name: record.name.clone(),
        publisher: record.publisher.clone(),
        version: record.version.clone(),
        display_name: record.display_name.clone(),
        description: record.description.clone(),
        icon: None,
        license: None,
        engine: record.properties.engine.clone(),
        extension_dependencies: record.properties.dependencies.clone(),
    }
}

/// Gallery served from a local registry file
pub struct RegistryGallery {
    base_dir: Utf8PathBuf,
    extensions: Vec<GalleryExtension>,
    companions: HashMap<String, Vec<String>>,
    engine: Version,
}

impl RegistryGallery {
    /// Load from a registry file; a missing file yields an empty gallery
    pub fn load_local(registry_path: &Utf8Path) -> Result<Self> {
        let base_dir = registry_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();

        if !registry_path.exists() {
            warn!("Registry not found at {}; gallery is empty", registry_path);
            return Ok(Self::from_file(RegistryFile::default(), base_dir));
        }

        debug!("Loading registry from {}", registry_path);
        let content = std::fs::read_to_string(registry_path)
            .with_context(|| format!("Failed to read registry {}", registry_path))?;
        let file: RegistryFile = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse registry {}", registry_path))?;

        info!(
            "Loaded {} gallery record(s) from {}",
            file.extensions.len(),
            registry_path
        );
        Ok(Self::from_file(file, base_dir))
    }

    pub fn from_file(file: RegistryFile, base_dir: impl Into<Utf8PathBuf>) -> Self {
        let engine = Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0));
        Self {
            base_dir: base_dir.into(),
            extensions: file.extensions,
            companions: file
                .companions
                .into_iter()
                .map(|(id, companions)| (canonical_id(&id), companions))
                .collect(),
            engine,
        }
    }

    /// Host engine version used for compatibility checks
    pub fn with_engine_version(mut self, engine: Version) -> Self {
        self.engine = engine;
        self
    }

    /// Versions of one extension, newest first
    fn versions_of(&self, id: &str) -> Vec<&GalleryExtension> {
        let mut versions: Vec<&GalleryExtension> = self
            .extensions
            .iter()
            .filter(|e| e.identifier.matches_id(id))
            .collect();
        versions.sort_by(|a, b| compare_versions(&b.version, &a.version));
        versions
    }

    fn latest_of(&self, id: &str) -> Option<&GalleryExtension> {
        self.versions_of(id).into_iter().next()
    }

    /// Newest version of every extension, most installed first
    fn latest(&self) -> Vec<&GalleryExtension> {
        let mut seen = HashSet::new();
        let mut latest: Vec<&GalleryExtension> = self
            .extensions
            .iter()
            .filter(|e| seen.insert(canonical_id(&e.identifier.id)))
            .filter_map(|e| self.latest_of(&e.identifier.id))
            .collect();
        latest.sort_by(|a, b| {
            b.install_count
                .cmp(&a.install_count)
                .then_with(|| a.identifier.id.cmp(&b.identifier.id))
        });
        latest
    }

    fn is_compatible(&self, record: &GalleryExtension) -> bool {
        match &record.properties.engine {
            None => true,
            Some(requirement) => VersionReq::parse(requirement)
                .map(|req| req.matches(&self.engine))
                .unwrap_or(false),
        }
    }

    fn resolve_asset(&self, asset: &GalleryAsset) -> Utf8PathBuf {
        if let Some(path) = Url::parse(&asset.uri)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        {
            return path;
        }
        let path = Utf8PathBuf::from(&asset.uri);
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    async fn read_asset(
        &self,
        record: &GalleryExtension,
        asset: Option<&GalleryAsset>,
        resource: &str,
    ) -> Result<String> {
        let asset =
            asset.ok_or_else(|| Error::not_available(record.identifier.id.clone(), resource))?;

        let primary = self.resolve_asset(asset);
        match tokio::fs::read_to_string(&primary).await {
            Ok(content) => Ok(content),
            Err(e) => match &asset.fallback_uri {
                Some(fallback) => {
                    debug!("{} unreadable ({}), trying fallback", primary, e);
                    let fallback = self.resolve_asset(&GalleryAsset::new(fallback.clone()));
                    tokio::fs::read_to_string(&fallback)
                        .await
                        .with_context(|| format!("Failed to read {}", fallback))
                }
                None => Err(e).with_context(|| format!("Failed to read {}", primary)),
            },
        }
    }
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[async_trait]
impl GallerySource for RegistryGallery {
    async fn query(&self, query: &GalleryQuery) -> Result<GalleryPage> {
        let needle = query.text.as_ref().map(|t| t.trim().to_lowercase());

        let matches: Vec<GalleryExtension> = self
            .latest()
            .into_iter()
            .filter(|e| {
                query.ids.is_empty()
                    || e.identifier
                        .uuid
                        .as_ref()
                        .is_some_and(|uuid| query.ids.contains(uuid))
            })
            .filter(|e| {
                query.names.is_empty() || query.names.iter().any(|n| e.identifier.matches_id(n))
            })
            .filter(|e| match &needle {
                None => true,
                Some(needle) => {
                    e.identifier.id.contains(needle.as_str())
                        || e.display_name
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(needle.as_str()))
                        || e.description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(needle.as_str()))
                }
            })
            .cloned()
            .collect();

        let total = matches.len();
        let page_size = if query.page_size == 0 {
            total.max(1)
        } else {
            query.page_size
        };
        let items = matches
            .into_iter()
            .skip(query.page * page_size)
            .take(page_size)
            .collect();

        Ok(GalleryPage { total, items })
    }

    async fn manifest(&self, extension: &GalleryExtension) -> Result<ExtensionManifest> {
        match &extension.assets.manifest {
            Some(asset) => {
                let path = self.resolve_asset(asset);
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read manifest {}", path))?;
                serde_yaml_ng::from_str(&content)
                    .with_context(|| format!("Failed to parse manifest {}", path))
            }
            None => Ok(manifest_from_record(extension)),
        }
    }

    async fn readme(&self, extension: &GalleryExtension) -> Result<String> {
        self.read_asset(extension, extension.assets.readme.as_ref(), "Readme")
            .await
    }

    async fn changelog(&self, extension: &GalleryExtension) -> Result<String> {
        self.read_asset(extension, extension.assets.changelog.as_ref(), "Changelog")
            .await
    }

    async fn all_dependencies(&self, extension: &GalleryExtension) -> Result<Vec<GalleryExtension>> {
        let mut visited = HashSet::from([canonical_id(&extension.identifier.id)]);
        let mut pending = extension.properties.dependencies.clone();
        let mut dependencies = Vec::new();

        while let Some(id) = pending.pop() {
            let id = canonical_id(&id);
            if !visited.insert(id.clone()) {
                continue;
            }
            match self.latest_of(&id) {
                Some(record) => {
                    pending.extend(record.properties.dependencies.iter().cloned());
                    dependencies.push(record.clone());
                }
                None => debug!("Dependency {} not in registry", id),
            }
        }

        Ok(dependencies)
    }

    async fn load_compatible_version(
        &self,
        extension: &GalleryExtension,
    ) -> Result<Option<GalleryExtension>> {
        Ok(self
            .versions_of(&extension.identifier.id)
            .into_iter()
            .find(|record| self.is_compatible(record))
            .cloned())
    }
}

impl CompanionLookup for RegistryGallery {
    fn companions(&self, id: &str) -> Vec<String> {
        self.companions
            .get(&canonical_id(id))
            .cloned()
            .unwrap_or_default()
    }
}
