use crate::entity::TelemetryData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telemetry events emitted by the extensions service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Gallery install completed (successfully or not)
    Install {
        extension: TelemetryData,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error_code: Option<String>,
    },

    /// Install that replaced an installed version
    Update {
        extension: TelemetryData,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error_code: Option<String>,
    },

    /// Uninstall completed
    Uninstall {
        extension: TelemetryData,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error_code: Option<String>,
    },

    /// Extension enabled by the user
    Enable { extension: TelemetryData },

    /// Extension disabled by the user
    Disable { extension: TelemetryData },
}

impl TelemetryEvent {
    /// Stable event name, e.g. `extension_gallery:install`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install { .. } => "extension_gallery:install",
            Self::Update { .. } => "extension_gallery:update",
            Self::Uninstall { .. } => "extension_gallery:uninstall",
            Self::Enable { .. } => "extension:enable",
            Self::Disable { .. } => "extension:disable",
        }
    }

    pub fn extension(&self) -> &TelemetryData {
        match self {
            Self::Install { extension, .. }
            | Self::Update { extension, .. }
            | Self::Uninstall { extension, .. }
            | Self::Enable { extension }
            | Self::Disable { extension } => extension,
        }
    }

    /// Outcome of lifecycle events; enablement events always succeed
    pub fn success(&self) -> bool {
        match self {
            Self::Install { success, .. }
            | Self::Update { success, .. }
            | Self::Uninstall { success, .. } => *success,
            Self::Enable { .. } | Self::Disable { .. } => true,
        }
    }
}

/// Event metadata envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID (UUID v4)
    pub event_id: String,

    /// Event timestamp (UTC)
    pub timestamp: DateTime<Utc>,

    /// Extension id (for indexing)
    pub extension_id: String,

    /// CLI version that published event
    pub cli_version: String,

    /// The actual event payload
    pub event: TelemetryEvent,
}

impl EventEnvelope {
    pub fn new(event: TelemetryEvent) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            extension_id: event.extension().id.clone(),
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
            event,
        }
    }
}
