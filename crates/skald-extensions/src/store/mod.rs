//! File-backed collaborators used by the CLI
//!
//! - [`ManifestInventory`]: installed extensions in `manifest.yaml`
//! - [`RegistryGallery`]: a YAML gallery registry with local assets
//! - [`FileEnablementStore`]: disabled ids in `enablement.yaml`

mod enablement;
mod manifest;
mod registry;

pub use enablement::FileEnablementStore;
pub use manifest::{ManifestInventory, PACKAGE_MANIFEST_FILE};
pub use registry::{manifest_from_record, RegistryFile, RegistryGallery};

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use url::Url;

/// `file://` URL for a local path
pub(crate) fn file_url(path: &Utf8Path) -> Result<String> {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .map_err(|_| anyhow!("Cannot build a file URL for {}", path))
}
