//! Service wiring for one CLI invocation

use anyhow::{Context as _, Result};
use camino::Utf8PathBuf;
use skald_core::error::Error;
use skald_core::types::ExtensionsSettings;
use skald_core::{SettingsLoader, SkaldPaths};
use skald_extensions::{
    ExtensionEntity, ExtensionsService, FileEnablementStore, GalleryQuery, ManifestInventory,
    RegistryGallery, ServiceBuilder, TelemetryLedger,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::notifier::TerminalNotifier;

/// How long a command waits for the service to observe an operation's
/// completion event
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// The service and file stores behind one command
pub struct AppContext {
    pub service: ExtensionsService,
    /// Settings as configured; the service itself never auto-updates in
    /// the CLI, `check-updates` applies the flag explicitly.
    pub settings: ExtensionsSettings,
    _settings_tx: watch::Sender<ExtensionsSettings>,
}

impl AppContext {
    /// Open the data directory, load the stores and the installed list
    pub async fn open(global: &GlobalArgs) -> Result<Self> {
        let paths = resolve_paths(global)?;
        paths
            .ensure()
            .with_context(|| format!("Failed to create data directory {}", paths.root()))?;

        let settings = SettingsLoader::with_dir(paths.root()).load()?;
        let workspace = workspace_folder(global)?;
        debug!(
            "Opening {} (workspace: {})",
            paths.root(),
            workspace.as_deref().map_or("none", |w| w.as_str())
        );

        let gallery = Arc::new(
            RegistryGallery::load_local(&paths.registry_path())
                .context("Failed to load gallery registry")?,
        );
        let inventory = Arc::new(ManifestInventory::new(
            paths.manifest_path(),
            paths.extensions_dir(),
            gallery.clone(),
        ));
        let enablement = Arc::new(
            FileEnablementStore::load(paths.enablement_path(), workspace.as_deref())
                .context("Failed to load enablement state")?,
        );
        let ledger = Arc::new(TelemetryLedger::new(paths.ledger_path()));

        let (settings_tx, settings_rx) = watch::channel(ExtensionsSettings {
            auto_update: false,
            ..settings.clone()
        });

        let service = ServiceBuilder::new(
            inventory,
            gallery.clone(),
            enablement.clone(),
            Arc::new(TerminalNotifier::new()),
        )
        .telemetry(ledger)
        .companions(gallery)
        .workbench(enablement.workbench_state())
        .settings(settings_rx)
        .build();

        service.listen();
        service
            .query_local()
            .await
            .context("Failed to load installed extensions")?;

        Ok(Self {
            service,
            settings,
            _settings_tx: settings_tx,
        })
    }

    /// Installed extension by id, else the gallery's latest record
    pub async fn find(&self, id: &str) -> Result<ExtensionEntity> {
        if let Some(extension) = self.service.get(id) {
            return Ok(extension);
        }
        self.find_in_gallery(id).await
    }

    /// Gallery record by id, merged with the installed extension if any
    pub async fn find_in_gallery(&self, id: &str) -> Result<ExtensionEntity> {
        let page = self
            .service
            .query_gallery(GalleryQuery::by_names(vec![id.to_string()]))
            .await?;
        page.items
            .into_iter()
            .next()
            .ok_or_else(|| Error::unknown_extension(id).into())
    }

    /// Wait until `done` holds, re-checking on every service change.
    ///
    /// Returns false when the timeout elapses or the service stops first.
    pub async fn settle(&self, done: impl Fn(&ExtensionsService) -> bool) -> bool {
        let changes = self.service.subscribe();
        wait_for_change(changes, SETTLE_TIMEOUT, || done(&self.service)).await
    }

    /// Stop background listeners
    pub fn close(self) {
        self.service.dispose();
    }
}

/// Re-check `done` after every change notification until it holds.
///
/// Returns false on timeout, or once the channel closes with `done` still unmet.
async fn wait_for_change(
    mut changes: broadcast::Receiver<()>,
    timeout: Duration,
    done: impl Fn() -> bool,
) -> bool {
    let wait = async {
        while !done() {
            match changes.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return done(),
            }
        }
        true
    };
    tokio::time::timeout(timeout, wait).await.unwrap_or(false)
}

/// Data directory from `--home`/`SKALD_HOME`, else the default
pub fn resolve_paths(global: &GlobalArgs) -> Result<SkaldPaths> {
    Ok(match &global.home {
        Some(home) => SkaldPaths::with_root(home.clone()),
        None => SkaldPaths::resolve()?,
    })
}

fn workspace_folder(global: &GlobalArgs) -> Result<Option<Utf8PathBuf>> {
    if global.no_folder {
        return Ok(None);
    }
    if let Some(folder) = &global.folder {
        return Ok(Some(folder.clone()));
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let cwd = Utf8PathBuf::try_from(cwd).context("Current directory is not valid UTF-8")?;
    Ok(Some(cwd))
}
