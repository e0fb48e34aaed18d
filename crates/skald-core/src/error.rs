//! Error types for skald-core

use thiserror::Error;

/// Result type alias using skald-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Skald
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid semver version
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Malformed extension identifier
    #[error("Invalid extension identifier: {id} (expected <publisher>.<name>)")]
    InvalidIdentifier { id: String },

    /// Extension not known locally or in the gallery
    #[error("Unknown extension: {id}")]
    UnknownExtension { id: String },

    /// Readme or changelog has no resolvable source
    #[error("{resource} not available for extension {extension}")]
    NotAvailable { extension: String, resource: String },

    /// Install requested for an extension without gallery metadata
    #[error("Missing gallery metadata for extension {extension}")]
    MissingGalleryMetadata { extension: String },

    /// Uninstall requested for an extension without a local record
    #[error("Missing local metadata for extension {extension}")]
    MissingLocalMetadata { extension: String },

    /// Disable rejected because enabled extensions still depend on it
    #[error("{}", dependents_message(.extension, .dependents))]
    DependentsBlocking {
        extension: String,
        dependents: Vec<String>,
    },

    /// DNS / connection-refused class failure talking to the gallery
    #[error("Gallery unreachable: {message}")]
    TransientNetwork { message: String },

    /// Operation superseded or canceled before it completed
    #[error("Operation canceled")]
    Canceled,

    /// Failure reported by a collaborator (inventory, gallery, store)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    /// Create an unknown extension error
    pub fn unknown_extension(id: impl Into<String>) -> Self {
        Self::UnknownExtension { id: id.into() }
    }

    /// Create a not available error for a readme/changelog resource
    pub fn not_available(extension: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::NotAvailable {
            extension: extension.into(),
            resource: resource.into(),
        }
    }

    /// Create a missing gallery metadata error
    pub fn missing_gallery(extension: impl Into<String>) -> Self {
        Self::MissingGalleryMetadata {
            extension: extension.into(),
        }
    }

    /// Create a missing local metadata error
    pub fn missing_local(extension: impl Into<String>) -> Self {
        Self::MissingLocalMetadata {
            extension: extension.into(),
        }
    }

    /// Create a dependents blocking error
    pub fn dependents_blocking(extension: impl Into<String>, dependents: Vec<String>) -> Self {
        Self::DependentsBlocking {
            extension: extension.into(),
            dependents,
        }
    }

    /// Create a transient network error
    pub fn transient_network(message: impl Into<String>) -> Self {
        Self::TransientNetwork {
            message: message.into(),
        }
    }

    /// Whether this error should be dropped silently instead of shown
    pub fn is_benign(&self) -> bool {
        match self {
            Self::TransientNetwork { .. } | Self::Canceled => true,
            Self::Io(e) => is_transient_io(e),
            Self::Other(e) => is_benign(e),
            _ => false,
        }
    }
}

/// Build the user-facing message for a blocked disable.
///
/// At most two dependents are named; anything beyond is summarised.
pub fn dependents_message(extension: &str, dependents: &[String]) -> String {
    match dependents {
        [] => format!("Cannot disable extension '{extension}'."),
        [one] => format!(
            "Cannot disable extension '{extension}'. Extension '{one}' depends on this."
        ),
        [first, second] => format!(
            "Cannot disable extension '{extension}'. Extensions '{first}' and '{second}' depend on this."
        ),
        [first, second, ..] => format!(
            "Cannot disable extension '{extension}'. Extensions '{first}', '{second}' and others depend on this."
        ),
    }
}

const TRANSIENT_MESSAGE_MARKERS: &[&str] = &[
    "ENOTFOUND",
    "ECONNREFUSED",
    "ECONNRESET",
    "ETIMEDOUT",
    "getaddrinfo",
    "failed to lookup address",
    "dns error",
    "connection refused",
];

fn is_transient_io(error: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        error.kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::TimedOut
    )
}

/// Whether any cause in the chain is a DNS / connection-refused class failure
pub fn is_transient_network(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(Error::TransientNetwork { .. }) = cause.downcast_ref::<Error>() {
            return true;
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if is_transient_io(io) {
                return true;
            }
        }
        let message = cause.to_string();
        TRANSIENT_MESSAGE_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    })
}

/// Whether any cause in the chain is a cancellation
pub fn is_canceled(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Canceled)))
}

/// Errors that background work and the URL flow drop without surfacing
pub fn is_benign(error: &anyhow::Error) -> bool {
    is_transient_network(error) || is_canceled(error)
}
