//! Command implementations

pub mod deps;
pub mod docs;
pub mod enablement;
pub mod info;
pub mod install;
pub mod list;
pub mod log;
pub mod open;
pub mod recommend;
pub mod search;
pub mod uninstall;
pub mod update;

use skald_extensions::{ExtensionEntity, ExtensionState, ExtensionsService};
use tabled::Tabled;

/// Enablement as shown to the user
pub(crate) fn enablement_label(extension: &ExtensionEntity) -> &'static str {
    if extension.disabled_globally() {
        "disabled"
    } else if extension.disabled_for_workspace() {
        "disabled (workspace)"
    } else {
        "enabled"
    }
}

/// Lifecycle state, with enablement for installed extensions
pub(crate) fn status_label(service: &ExtensionsService, extension: &ExtensionEntity) -> String {
    match service.state_of(extension) {
        ExtensionState::Installed => enablement_label(extension).to_string(),
        other => other.to_string(),
    }
}

/// One extension in a listing
#[derive(Tabled, serde::Serialize)]
pub(crate) struct ExtensionRow {
    id: String,
    name: String,
    version: String,
    #[tabled(rename = "latest")]
    latest_version: String,
    status: String,
    #[tabled(skip)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    system: bool,
}

impl ExtensionRow {
    pub(crate) fn new(service: &ExtensionsService, extension: &ExtensionEntity) -> Self {
        let latest_version = if extension.outdated() {
            extension.latest_version()
        } else {
            "-".to_string()
        };
        Self {
            id: extension.id(),
            name: extension.display_name(),
            version: extension.version(),
            latest_version,
            status: status_label(service, extension),
            system: extension.is_system(),
        }
    }
}
