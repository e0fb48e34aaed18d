//! Enable/disable workflow
//!
//! Toggling an extension optionally toggles the user extensions it
//! depends on. Disabling is refused while an enabled extension outside
//! the toggled set still depends on something in it. Writes are applied
//! one flag at a time and rolled back if any write fails.

use super::ExtensionsService;
use crate::entity::ExtensionEntity;
use crate::events::TelemetryEvent;
use crate::graph::dependency_closure;
use crate::traits::Severity;
use skald_core::error::{Error, Result};
use skald_core::types::{canonical_id, EnablementScope, ExtensionIdentifier, ExtensionType};
use std::collections::HashSet;
use tracing::{debug, info, warn};

const ENABLE_OPTIONS: [&str; 2] = ["Enable", "Do not enable"];
const DISABLE_OPTIONS: [&str; 3] = ["Only", "All", "Cancel"];

/// Result of an enable/disable request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnablementOutcome {
    /// Flags were written for `extensions`, target first
    Applied {
        extensions: Vec<String>,
        /// Whether any stored flag actually changed
        changed: bool,
    },
    /// System extensions are never toggled
    SystemExtension,
    /// The dependency prompt was declined or dismissed
    Canceled,
}

enum DependencyChoice {
    Only,
    All,
    Cancel,
}

/// Installed extensions that would break: not disabled in the requested
/// scope, outside the toggled set, and depending on something inside it
fn dependents_after_disablement<'a>(
    extension: &ExtensionEntity,
    dependencies: &[ExtensionEntity],
    installed: &'a [ExtensionEntity],
    workspace: bool,
) -> Vec<&'a ExtensionEntity> {
    let toggled: HashSet<String> = std::iter::once(extension.id())
        .chain(dependencies.iter().map(|d| d.id()))
        .collect();

    installed
        .iter()
        .filter(|candidate| {
            let declared = candidate.dependencies();
            !declared.is_empty()
                && !toggled.contains(&candidate.id())
                && !candidate.disabled_in(workspace)
                && declared.iter().any(|d| toggled.contains(&canonical_id(d)))
        })
        .collect()
}

impl ExtensionsService {
    /// Enable or disable `extension`, globally or for the open workspace
    pub async fn set_enablement(
        &self,
        extension: &ExtensionEntity,
        enable: bool,
        workspace: bool,
    ) -> Result<EnablementOutcome> {
        if extension.is_system() {
            debug!("Ignoring enablement change for system extension {}", extension.id());
            return Ok(EnablementOutcome::SystemExtension);
        }

        let installed = self.installed();
        let closure: Vec<ExtensionEntity> = dependency_closure(
            &extension.dependencies(),
            &installed,
            HashSet::from([extension.id()]),
            |candidate| {
                candidate.kind() == ExtensionType::User
                    && (enable || !candidate.disabled_in(workspace))
            },
        )
        .into_iter()
        .cloned()
        .collect();

        let dependencies = if closure.is_empty() {
            closure
        } else {
            match self.confirm_dependencies(extension, enable).await {
                DependencyChoice::All => closure,
                DependencyChoice::Only => Vec::new(),
                DependencyChoice::Cancel => return Ok(EnablementOutcome::Canceled),
            }
        };

        if !enable {
            let dependents =
                dependents_after_disablement(extension, &dependencies, &installed, workspace);
            if !dependents.is_empty() {
                return Err(Error::dependents_blocking(
                    extension.display_name(),
                    dependents.iter().map(|d| d.display_name()).collect(),
                ));
            }
        }

        let targets: Vec<ExtensionIdentifier> = std::iter::once(extension)
            .chain(dependencies.iter())
            .map(|e| e.identifier())
            .collect();
        let changed = self.write_enablement(&targets, enable, workspace).await?;
        self.refresh_enablement(&targets);

        info!(
            "{} {} ({} scope)",
            if enable { "Enabled" } else { "Disabled" },
            targets
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            if workspace { "workspace" } else { "global" }
        );

        let data = extension.telemetry_data();
        self.inner.telemetry.log(if enable {
            TelemetryEvent::Enable { extension: data }
        } else {
            TelemetryEvent::Disable { extension: data }
        });

        Ok(EnablementOutcome::Applied {
            extensions: targets.into_iter().map(|t| t.id).collect(),
            changed,
        })
    }

    async fn confirm_dependencies(&self, extension: &ExtensionEntity, enable: bool) -> DependencyChoice {
        let name = extension.display_name();
        if enable {
            let message = format!("Enabling '{name}' also enables its dependencies. Continue?");
            match self
                .inner
                .notifier
                .choose(Severity::Info, &message, &ENABLE_OPTIONS, 1)
                .await
            {
                Some(0) => DependencyChoice::All,
                _ => DependencyChoice::Cancel,
            }
        } else {
            let message = format!("Disable only '{name}', or its dependencies as well?");
            match self
                .inner
                .notifier
                .choose(Severity::Info, &message, &DISABLE_OPTIONS, 2)
                .await
            {
                Some(0) => DependencyChoice::Only,
                Some(1) => DependencyChoice::All,
                _ => DependencyChoice::Cancel,
            }
        }
    }

    /// Write flags for every target, undoing earlier writes on failure.
    /// Returns whether any flag changed.
    async fn write_enablement(
        &self,
        targets: &[ExtensionIdentifier],
        enable: bool,
        workspace: bool,
    ) -> Result<bool> {
        let mut written: Vec<(ExtensionIdentifier, EnablementScope)> = Vec::new();

        for identifier in targets {
            if let Err(e) = self
                .write_flags(identifier, enable, workspace, &mut written)
                .await
            {
                self.rollback(&written, enable).await;
                return Err(e);
            }
        }

        Ok(!written.is_empty())
    }

    async fn write_flags(
        &self,
        identifier: &ExtensionIdentifier,
        enable: bool,
        workspace: bool,
        written: &mut Vec<(ExtensionIdentifier, EnablementScope)>,
    ) -> Result<()> {
        let store = &self.inner.enablement;

        if workspace {
            if store
                .set_enablement(identifier, enable, EnablementScope::Workspace)
                .await?
            {
                written.push((identifier.clone(), EnablementScope::Workspace));
            }
            return Ok(());
        }

        if store
            .set_enablement(identifier, enable, EnablementScope::Global)
            .await?
        {
            written.push((identifier.clone(), EnablementScope::Global));
        }

        // Enabling globally also clears a workspace-level disable
        if enable
            && !self.inner.workbench.is_empty()
            && store
                .set_enablement(identifier, true, EnablementScope::Workspace)
                .await?
        {
            written.push((identifier.clone(), EnablementScope::Workspace));
        }

        Ok(())
    }

    async fn rollback(&self, written: &[(ExtensionIdentifier, EnablementScope)], enable: bool) {
        for (identifier, scope) in written.iter().rev() {
            if let Err(e) = self
                .inner
                .enablement
                .set_enablement(identifier, !enable, *scope)
                .await
            {
                warn!("Failed to restore enablement of {}: {:#}", identifier, e);
            }
        }
        let restored: Vec<ExtensionIdentifier> = written.iter().map(|(id, _)| id.clone()).collect();
        self.refresh_enablement(&restored);
    }
}
