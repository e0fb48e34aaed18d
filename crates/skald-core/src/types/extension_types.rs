//! Local and gallery extension records

use super::identifier::{extension_id, ExtensionIdentifier};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who owns an installed extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    /// Shipped with the host; never user-toggleable
    System,
    /// Installed by the user
    #[default]
    User,
}

/// Package manifest (extension.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionManifest {
    /// Extension name (without publisher)
    pub name: String,

    /// Publisher namespace
    pub publisher: String,

    /// Package version
    pub version: String,

    /// Human readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Icon path relative to the extension location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// License identifier or file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Host engine constraint (e.g. "^1.20")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    /// Ids of extensions this one requires
    #[serde(default)]
    pub extension_dependencies: Vec<String>,
}

impl ExtensionManifest {
    /// Identifier derived from publisher and name
    pub fn identifier(&self) -> ExtensionIdentifier {
        ExtensionIdentifier::from_parts(&self.publisher, &self.name)
    }

    /// Id derived from publisher and name
    pub fn id(&self) -> String {
        extension_id(&self.publisher, &self.name)
    }
}

/// Where an installed extension came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOrigin {
    /// Installed from the gallery
    Gallery,
    /// Installed from a local package file
    Package,
    /// Bundled with the host
    Builtin,
}

/// Install-time metadata recorded next to an installed extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstallMetadata {
    /// Installation timestamp
    pub installed_at: DateTime<Utc>,

    /// Installation source
    pub origin: InstallOrigin,

    /// Gallery uuid at install time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_uuid: Option<String>,
}

/// An installed extension as reported by the local inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalExtension {
    /// Local identity
    pub identifier: ExtensionIdentifier,

    /// System or user extension
    #[serde(rename = "type", default)]
    pub kind: ExtensionType,

    /// Install directory
    pub location: Utf8PathBuf,

    /// Parsed package manifest
    pub manifest: ExtensionManifest,

    /// Install-time metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<InstallMetadata>,

    /// Readme reference (URL, usually `file://`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_url: Option<String>,

    /// Changelog reference (URL, usually `file://`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
}

/// A downloadable gallery asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GalleryAsset {
    /// Primary location
    pub uri: String,

    /// Secondary location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_uri: Option<String>,
}

impl GalleryAsset {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            fallback_uri: None,
        }
    }
}

/// Assets published with a gallery version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GalleryAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<GalleryAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<GalleryAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<GalleryAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<GalleryAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<GalleryAsset>,
}

/// Version properties of a gallery record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GalleryProperties {
    /// Declared dependency ids
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Host engine constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

/// An extension version as published in the gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GalleryExtension {
    /// Gallery identity (uuid normally present)
    pub identifier: ExtensionIdentifier,

    /// Extension name (without publisher)
    pub name: String,

    /// Publisher namespace
    pub publisher: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Published version
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub install_count: u64,

    #[serde(default)]
    pub rating: f32,

    #[serde(default)]
    pub rating_count: u32,

    #[serde(default)]
    pub assets: GalleryAssets,

    #[serde(default)]
    pub properties: GalleryProperties,
}

/// Enablement scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnablementScope {
    Global,
    Workspace,
}

impl EnablementScope {
    pub fn from_workspace_flag(workspace: bool) -> Self {
        if workspace {
            Self::Workspace
        } else {
            Self::Global
        }
    }
}

/// What the host currently has open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkbenchState {
    /// No folder open
    #[default]
    Empty,
    /// A single folder
    Folder,
    /// A multi-root workspace
    Workspace,
}

impl WorkbenchState {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
