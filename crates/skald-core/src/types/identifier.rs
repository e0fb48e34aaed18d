//! Extension identity
//!
//! An extension is addressed by `<publisher>.<name>`, compared
//! case-insensitively, and optionally by the gallery's stable uuid.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_-]*\.[a-z0-9][a-z0-9_.-]*$").expect("valid identifier regex")
});

/// Canonical (lowercase, trimmed) form of an extension id
pub fn canonical_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Build an id from its publisher and name parts
pub fn extension_id(publisher: &str, name: &str) -> String {
    canonical_id(&format!("{publisher}.{name}"))
}

/// Identity of an extension
///
/// Derived equality is structural; use [`ExtensionIdentifier::matches`] to
/// decide whether two identifiers name the same extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionIdentifier {
    /// `<publisher>.<name>` in canonical form
    pub id: String,

    /// Stable gallery identity, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl ExtensionIdentifier {
    /// Create an identifier without a gallery uuid
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: canonical_id(id.as_ref()),
            uuid: None,
        }
    }

    /// Create an identifier from publisher and name
    pub fn from_parts(publisher: &str, name: &str) -> Self {
        Self {
            id: extension_id(publisher, name),
            uuid: None,
        }
    }

    /// Attach a gallery uuid
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Parse and validate user input such as `Publisher.Name`
    pub fn parse(input: &str) -> Result<Self> {
        let id = canonical_id(input);
        if !IDENTIFIER_PATTERN.is_match(&id) {
            return Err(Error::invalid_identifier(input));
        }
        Ok(Self { id, uuid: None })
    }

    /// Publisher part of the id
    pub fn publisher(&self) -> &str {
        self.id.split_once('.').map(|(p, _)| p).unwrap_or(&self.id)
    }

    /// Name part of the id
    pub fn name(&self) -> &str {
        self.id.split_once('.').map(|(_, n)| n).unwrap_or(&self.id)
    }

    /// Same-extension check: uuids when both sides carry one, ids otherwise
    pub fn matches(&self, other: &ExtensionIdentifier) -> bool {
        match (&self.uuid, &other.uuid) {
            (Some(a), Some(b)) => a == b,
            _ => self.id.eq_ignore_ascii_case(&other.id),
        }
    }

    /// Case-insensitive id comparison
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id.trim())
    }
}

impl fmt::Display for ExtensionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
