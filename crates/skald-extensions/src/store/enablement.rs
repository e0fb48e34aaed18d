//! Enablement flags persisted in `~/.skald/enablement.yaml`
//!
//! Global disables are a flat list; workspace disables are keyed by the
//! workspace path.

use crate::traits::EnablementStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use skald_core::types::{EnablementScope, ExtensionIdentifier, WorkbenchState};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct EnablementFile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    globally_disabled: Vec<ExtensionIdentifier>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    workspaces: BTreeMap<String, Vec<ExtensionIdentifier>>,
}

/// Toggle `identifier` in `list`; returns whether the list changed
fn apply(list: &mut Vec<ExtensionIdentifier>, identifier: &ExtensionIdentifier, enable: bool) -> bool {
    let before = list.len();
    if enable {
        list.retain(|d| !d.matches(identifier));
        list.len() != before
    } else if list.iter().any(|d| d.matches(identifier)) {
        false
    } else {
        list.push(identifier.clone());
        true
    }
}

/// YAML-backed [`EnablementStore`]
pub struct FileEnablementStore {
    path: Utf8PathBuf,
    workspace: Option<String>,
    state: Mutex<EnablementFile>,
    write_lock: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<ExtensionIdentifier>,
}

impl FileEnablementStore {
    /// Load flags from `path`. `workspace` selects which workspace's
    /// flags this store reads and writes.
    pub fn load(path: impl Into<Utf8PathBuf>, workspace: Option<&Utf8Path>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path))?;
            if content.trim().is_empty() {
                EnablementFile::default()
            } else {
                serde_yaml_ng::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path))?
            }
        } else {
            EnablementFile::default()
        };

        let (changes, _) = broadcast::channel(64);
        Ok(Self {
            path,
            workspace: workspace.map(|w| w.as_str().to_string()),
            state: Mutex::new(state),
            write_lock: tokio::sync::Mutex::new(()),
            changes,
        })
    }

    /// Folder when a workspace path was given, otherwise empty
    pub fn workbench_state(&self) -> WorkbenchState {
        if self.workspace.is_some() {
            WorkbenchState::Folder
        } else {
            WorkbenchState::Empty
        }
    }

    fn state(&self) -> MutexGuard<'_, EnablementFile> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn persist(&self, file: &EnablementFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_yaml_ng::to_string(file)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path))?;
        Ok(())
    }
}

#[async_trait]
impl EnablementStore for FileEnablementStore {
    fn globally_disabled(&self) -> Vec<ExtensionIdentifier> {
        self.state().globally_disabled.clone()
    }

    fn workspace_disabled(&self) -> Vec<ExtensionIdentifier> {
        match &self.workspace {
            Some(key) => self.state().workspaces.get(key).cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn set_enablement(
        &self,
        identifier: &ExtensionIdentifier,
        enable: bool,
        scope: EnablementScope,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.state().clone();
        let changed = match scope {
            EnablementScope::Global => apply(&mut next.globally_disabled, identifier, enable),
            EnablementScope::Workspace => {
                let Some(key) = &self.workspace else {
                    bail!("No workspace is open");
                };
                let list = next.workspaces.entry(key.clone()).or_default();
                let changed = apply(list, identifier, enable);
                if list.is_empty() {
                    next.workspaces.remove(key);
                }
                changed
            }
        };
        if !changed {
            return Ok(false);
        }

        self.persist(&next).await?;
        *self.state() = next;
        debug!(
            "{} {} ({:?})",
            if enable { "Enabled" } else { "Disabled" },
            identifier,
            scope
        );

        let _ = self.changes.send(identifier.clone());
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<ExtensionIdentifier> {
        self.changes.subscribe()
    }
}
