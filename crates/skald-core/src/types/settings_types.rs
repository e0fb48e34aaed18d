//! Settings controlling background reconciliation

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extension service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionsSettings {
    /// Reinstall outdated extensions automatically
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,

    /// Period between gallery syncs, in seconds
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Throttle applied before an auto-update sweep, in milliseconds
    #[serde(default = "default_auto_update_delay")]
    pub auto_update_delay_ms: u64,

    /// Page size for gallery searches
    #[serde(default = "default_page_size")]
    pub gallery_page_size: usize,
}

impl Default for ExtensionsSettings {
    fn default() -> Self {
        Self {
            auto_update: default_auto_update(),
            sync_interval_secs: default_sync_interval(),
            auto_update_delay_ms: default_auto_update_delay(),
            gallery_page_size: default_page_size(),
        }
    }
}

impl ExtensionsSettings {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn auto_update_delay(&self) -> Duration {
        Duration::from_millis(self.auto_update_delay_ms)
    }
}

/// Partial settings as read from a file; unset keys keep the lower layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsOverlay {
    pub auto_update: Option<bool>,
    pub sync_interval_secs: Option<u64>,
    pub auto_update_delay_ms: Option<u64>,
    pub gallery_page_size: Option<usize>,
}

fn default_auto_update() -> bool {
    true
}
fn default_sync_interval() -> u64 {
    60 * 60 * 12 // 12 hours
}
fn default_auto_update_delay() -> u64 {
    1000
}
fn default_page_size() -> usize {
    50
}
