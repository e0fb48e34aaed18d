//! Fluent builders for extension records

#![allow(dead_code)]

use camino::Utf8PathBuf;
use chrono::Utc;
use skald_core::types::{
    ExtensionIdentifier, ExtensionManifest, ExtensionType, GalleryAsset, GalleryAssets,
    GalleryExtension, GalleryProperties, InstallMetadata, InstallOrigin, LocalExtension,
};

fn split(id: &str) -> (String, String) {
    let (publisher, name) = id.split_once('.').expect("id must be <publisher>.<name>");
    (publisher.to_string(), name.to_string())
}

/// Builder for installed records
pub struct LocalBuilder {
    id: String,
    version: String,
    kind: ExtensionType,
    display_name: Option<String>,
    dependencies: Vec<String>,
    gallery_uuid: Option<String>,
    readme_url: Option<String>,
    changelog_url: Option<String>,
}

impl LocalBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            version: "1.0.0".to_string(),
            kind: ExtensionType::User,
            display_name: None,
            dependencies: Vec::new(),
            gallery_uuid: None,
            readme_url: None,
            changelog_url: None,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn system(mut self) -> Self {
        self.kind = ExtensionType::System;
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Record the gallery uuid in install metadata
    pub fn gallery_uuid(mut self, uuid: &str) -> Self {
        self.gallery_uuid = Some(uuid.to_string());
        self
    }

    pub fn readme_url(mut self, url: &str) -> Self {
        self.readme_url = Some(url.to_string());
        self
    }

    pub fn changelog_url(mut self, url: &str) -> Self {
        self.changelog_url = Some(url.to_string());
        self
    }

    pub fn build(self) -> LocalExtension {
        let (publisher, name) = split(&self.id);
        LocalExtension {
            identifier: ExtensionIdentifier::new(&self.id),
            kind: self.kind,
            location: Utf8PathBuf::from(format!("/ext/{}-{}", self.id, self.version)),
            manifest: ExtensionManifest {
                name,
                publisher,
                version: self.version,
                display_name: self.display_name,
                extension_dependencies: self.dependencies,
                ..Default::default()
            },
            metadata: Some(InstallMetadata {
                installed_at: Utc::now(),
                origin: InstallOrigin::Gallery,
                gallery_uuid: self.gallery_uuid,
            }),
            readme_url: self.readme_url,
            changelog_url: self.changelog_url,
        }
    }
}

/// Builder for gallery records
pub struct GalleryBuilder {
    id: String,
    uuid: Option<String>,
    version: String,
    display_name: Option<String>,
    dependencies: Vec<String>,
    engine: Option<String>,
    readme: bool,
    changelog: bool,
    install_count: u64,
}

impl GalleryBuilder {
    pub fn new(id: &str, uuid: &str) -> Self {
        Self {
            id: id.to_string(),
            uuid: Some(uuid.to_string()),
            version: "1.0.0".to_string(),
            display_name: None,
            dependencies: Vec::new(),
            engine: None,
            readme: false,
            changelog: false,
            install_count: 0,
        }
    }

    pub fn without_uuid(mut self) -> Self {
        self.uuid = None;
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn engine(mut self, requirement: &str) -> Self {
        self.engine = Some(requirement.to_string());
        self
    }

    pub fn with_readme(mut self) -> Self {
        self.readme = true;
        self
    }

    pub fn with_changelog(mut self) -> Self {
        self.changelog = true;
        self
    }

    pub fn install_count(mut self, count: u64) -> Self {
        self.install_count = count;
        self
    }

    pub fn build(self) -> GalleryExtension {
        let (publisher, name) = split(&self.id);
        let mut identifier = ExtensionIdentifier::new(&self.id);
        identifier.uuid = self.uuid;
        let asset = |kind: &str| GalleryAsset::new(format!("https://gallery.test/{}/{}", self.id, kind));

        GalleryExtension {
            identifier,
            name,
            publisher,
            publisher_display_name: None,
            display_name: self.display_name.clone(),
            version: self.version.clone(),
            description: None,
            install_count: self.install_count,
            rating: 0.0,
            rating_count: 0,
            assets: GalleryAssets {
                readme: self.readme.then(|| asset("readme")),
                changelog: self.changelog.then(|| asset("changelog")),
                ..Default::default()
            },
            properties: GalleryProperties {
                dependencies: self.dependencies.clone(),
                engine: self.engine.clone(),
            },
        }
    }
}

/// Shorthand for a plain installed user extension
pub fn local(id: &str, version: &str) -> LocalExtension {
    LocalBuilder::new(id).version(version).build()
}

/// Shorthand for a plain gallery record
pub fn gallery(id: &str, uuid: &str, version: &str) -> GalleryExtension {
    GalleryBuilder::new(id, uuid).version(version).build()
}

/// Local record produced by installing `record`
pub fn installed_from(record: &GalleryExtension) -> LocalExtension {
    let mut builder = LocalBuilder::new(&record.identifier.id)
        .version(&record.version)
        .depends_on(
            &record
                .properties
                .dependencies
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        );
    if let Some(uuid) = &record.identifier.uuid {
        builder = builder.gallery_uuid(uuid);
    }
    builder.build()
}
