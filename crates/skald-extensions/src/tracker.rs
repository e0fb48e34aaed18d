//! In-flight operation tracking and state derivation

use crate::entity::ExtensionEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skald_core::types::{ExtensionIdentifier, GalleryExtension};
use std::time::{Duration, Instant};

/// Kind of an in-flight operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Installing,
    /// An install that replaced an already-installed version
    Updating,
    Uninstalling,
}

/// Derived lifecycle state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionState {
    Installing,
    Installed,
    Uninstalling,
    Uninstalled,
}

impl std::fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Uninstalling => "uninstalling",
            Self::Uninstalled => "uninstalled",
        };
        f.write_str(s)
    }
}

/// An operation that has started but not completed
#[derive(Debug, Clone)]
pub struct ActiveOperation {
    pub operation: Operation,
    pub extension: ExtensionEntity,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl ActiveOperation {
    fn new(operation: Operation, extension: ExtensionEntity) -> Self {
        Self {
            operation,
            extension,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Installing entries keyed by gallery identity, uninstalling entries by local id
#[derive(Debug, Default)]
pub struct OperationTracker {
    installing: Vec<ActiveOperation>,
    uninstalling: Vec<ActiveOperation>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installing(&self) -> &[ActiveOperation] {
        &self.installing
    }

    pub fn uninstalling(&self) -> &[ActiveOperation] {
        &self.uninstalling
    }

    /// Record an install of `extension`, which must carry the gallery facet
    pub fn start_install(&mut self, extension: ExtensionEntity) {
        self.installing
            .push(ActiveOperation::new(Operation::Installing, extension));
    }

    /// Remove and return the install operation for a gallery record
    pub fn finish_install(&mut self, gallery: &GalleryExtension) -> Option<ActiveOperation> {
        let index = self.installing.iter().position(|op| {
            op.extension
                .gallery()
                .is_some_and(|g| g.identifier.matches(&gallery.identifier))
        })?;
        Some(self.installing.remove(index))
    }

    /// Record an uninstall. A repeat start keeps the original start time.
    ///
    /// Returns `false` when the uninstall was already tracked.
    pub fn start_uninstall(&mut self, extension: ExtensionEntity) -> bool {
        let id = extension.id();
        match self.uninstalling.iter().position(|op| op.extension.id() == id) {
            Some(index) => {
                let existing = self.uninstalling.remove(index);
                self.uninstalling.insert(0, existing);
                false
            }
            None => {
                self.uninstalling
                    .insert(0, ActiveOperation::new(Operation::Uninstalling, extension));
                true
            }
        }
    }

    /// Remove and return the uninstall operation for a local id
    pub fn finish_uninstall(&mut self, identifier: &ExtensionIdentifier) -> Option<ActiveOperation> {
        let index = self
            .uninstalling
            .iter()
            .position(|op| identifier.matches_id(&op.extension.id()))?;
        Some(self.uninstalling.remove(index))
    }

    pub fn is_installing(&self, extension: &ExtensionEntity) -> bool {
        let Some(gallery) = extension.gallery() else {
            return false;
        };
        self.installing.iter().any(|op| {
            op.extension
                .gallery()
                .is_some_and(|g| g.identifier.matches(&gallery.identifier))
        })
    }

    pub fn is_uninstalling(&self, extension: &ExtensionEntity) -> bool {
        let id = extension.id();
        self.uninstalling.iter().any(|op| op.extension.id() == id)
    }

    /// Derive an entity's state. Precedence: installing, uninstalling,
    /// installed, uninstalled.
    pub fn state_of(&self, extension: &ExtensionEntity, installed: &[ExtensionEntity]) -> ExtensionState {
        if self.is_installing(extension) {
            return ExtensionState::Installing;
        }
        if self.is_uninstalling(extension) {
            return ExtensionState::Uninstalling;
        }

        let is_installed = installed.iter().any(|candidate| {
            candidate.handle() == extension.handle()
                || match (candidate.gallery(), extension.gallery()) {
                    (Some(a), Some(b)) => a.identifier.matches(&b.identifier),
                    _ => false,
                }
        });
        if is_installed {
            ExtensionState::Installed
        } else {
            ExtensionState::Uninstalled
        }
    }
}
