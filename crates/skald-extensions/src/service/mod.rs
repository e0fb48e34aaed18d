//! Extensions service
//!
//! Owns the installed-entity list and the in-flight operation tracker,
//! applies inventory and enablement events to them, and drives the
//! enable/disable, gallery sync and auto-update workflows.
//!
//! State lives behind a plain mutex that is never held across an await,
//! so every mutation is applied atomically between suspension points.

mod enablement;
mod sync;

pub use enablement::EnablementOutcome;

use crate::entity::{EntityHandle, ExtensionEntity, Facets};
use crate::events::TelemetryEvent;
use crate::graph::{DependencyGraphView, ExtensionLookup};
use crate::ledger::TracingTelemetry;
use crate::scheduler::ThrottledDelayer;
use crate::tracker::{ExtensionState, Operation, OperationTracker};
use crate::traits::{
    CompanionLookup, EnablementStore, GalleryQuery, GallerySource, InstallTarget, InventoryEvent,
    LocalInventory, Notifier, TelemetrySink,
};
use anyhow::Context;
use camino::Utf8PathBuf;
use skald_core::error::{is_benign, Error, Result};
use skald_core::types::{
    canonical_id, ExtensionIdentifier, ExtensionsSettings, GalleryExtension, LocalExtension,
    WorkbenchState,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// URL scheme handled by [`ExtensionsService::open_url`]
pub const URL_SCHEME: &str = "skald";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What to install
#[derive(Debug, Clone)]
pub enum InstallSource {
    /// The gallery facet of an entity
    Gallery(ExtensionEntity),
    /// A package on disk
    Package(Utf8PathBuf),
}

/// One page of results
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Total matches across all pages
    pub total: usize,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            page: 0,
            page_size: 0,
            items: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    next_handle: u64,
    installed: Vec<ExtensionEntity>,
    tracker: OperationTracker,
}

impl ServiceState {
    fn allocate(&mut self, facets: Facets) -> ExtensionEntity {
        self.next_handle += 1;
        ExtensionEntity::new(EntityHandle::new(self.next_handle), facets)
    }

    fn installed_by_local_id(&self, id: &str) -> Option<&ExtensionEntity> {
        self.installed
            .iter()
            .find(|e| e.local().is_some_and(|l| l.identifier.matches_id(id)))
    }
}

struct ServiceInner {
    inventory: Arc<dyn LocalInventory>,
    gallery: Arc<dyn GallerySource>,
    enablement: Arc<dyn EnablementStore>,
    notifier: Arc<dyn Notifier>,
    telemetry: Arc<dyn TelemetrySink>,
    companions: Option<Arc<dyn CompanionLookup>>,
    workbench: WorkbenchState,
    settings: watch::Receiver<ExtensionsSettings>,
    state: Mutex<ServiceState>,
    changes: broadcast::Sender<()>,
    sync_delayer: ThrottledDelayer,
    auto_update_delayer: ThrottledDelayer,
    listeners: Mutex<Vec<JoinHandle<()>>>,
    last_sync_error: Mutex<Option<String>>,
    auto_update_enabled: AtomicBool,
}

/// Builder for [`ExtensionsService`]
pub struct ServiceBuilder {
    inventory: Arc<dyn LocalInventory>,
    gallery: Arc<dyn GallerySource>,
    enablement: Arc<dyn EnablementStore>,
    notifier: Arc<dyn Notifier>,
    telemetry: Arc<dyn TelemetrySink>,
    companions: Option<Arc<dyn CompanionLookup>>,
    workbench: WorkbenchState,
    settings: watch::Receiver<ExtensionsSettings>,
}

impl ServiceBuilder {
    pub fn new(
        inventory: Arc<dyn LocalInventory>,
        gallery: Arc<dyn GallerySource>,
        enablement: Arc<dyn EnablementStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (_, settings) = watch::channel(ExtensionsSettings::default());
        Self {
            inventory,
            gallery,
            enablement,
            notifier,
            telemetry: Arc::new(TracingTelemetry),
            companions: None,
            workbench: WorkbenchState::default(),
            settings,
        }
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn companions(mut self, companions: Arc<dyn CompanionLookup>) -> Self {
        self.companions = Some(companions);
        self
    }

    pub fn workbench(mut self, workbench: WorkbenchState) -> Self {
        self.workbench = workbench;
        self
    }

    /// Live settings; changes are picked up by [`ExtensionsService::listen`]
    pub fn settings(mut self, settings: watch::Receiver<ExtensionsSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> ExtensionsService {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let auto_update = self.settings.borrow().auto_update;
        ExtensionsService {
            inner: Arc::new(ServiceInner {
                inventory: self.inventory,
                gallery: self.gallery,
                enablement: self.enablement,
                notifier: self.notifier,
                telemetry: self.telemetry,
                companions: self.companions,
                workbench: self.workbench,
                settings: self.settings,
                state: Mutex::new(ServiceState::default()),
                changes,
                sync_delayer: ThrottledDelayer::new("gallery-sync"),
                auto_update_delayer: ThrottledDelayer::new("auto-update"),
                listeners: Mutex::new(Vec::new()),
                last_sync_error: Mutex::new(None),
                auto_update_enabled: AtomicBool::new(auto_update),
            }),
        }
    }
}

/// Single source of truth for extension state
#[derive(Clone)]
pub struct ExtensionsService {
    inner: Arc<ServiceInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn apply_flags(
    extension: &mut ExtensionEntity,
    globally_disabled: &[ExtensionIdentifier],
    workspace_disabled: &[ExtensionIdentifier],
) {
    let identifier = extension.identifier();
    extension.set_disabled(
        globally_disabled.iter().any(|d| d.matches(&identifier)),
        workspace_disabled.iter().any(|d| d.matches(&identifier)),
    );
}

fn lifecycle_event(
    operation: Operation,
    extension: &ExtensionEntity,
    elapsed: Duration,
    error_code: Option<String>,
) -> TelemetryEvent {
    let extension = extension.telemetry_data();
    let success = error_code.is_none();
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match operation {
        Operation::Installing => TelemetryEvent::Install {
            extension,
            success,
            duration_ms,
            error_code,
        },
        Operation::Updating => TelemetryEvent::Update {
            extension,
            success,
            duration_ms,
            error_code,
        },
        Operation::Uninstalling => TelemetryEvent::Uninstall {
            extension,
            success,
            duration_ms,
            error_code,
        },
    }
}

/// Extract the extension id from `skald://extension/<publisher>.<name>`
fn parse_extension_url(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    if url.scheme() != URL_SCHEME || url.host_str() != Some("extension") {
        return None;
    }
    let id = url.path().trim_matches('/');
    ExtensionIdentifier::parse(id).ok().map(|identifier| identifier.id)
}

impl ExtensionsService {
    fn upgrade(weak: &Weak<ServiceInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn downgrade(&self) -> Weak<ServiceInner> {
        Arc::downgrade(&self.inner)
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        lock(&self.inner.state)
    }

    fn notify_changed(&self) {
        // No receivers is fine
        let _ = self.inner.changes.send(());
    }

    fn disabled_sets(&self) -> (Vec<ExtensionIdentifier>, Vec<ExtensionIdentifier>) {
        (
            self.inner.enablement.globally_disabled(),
            self.inner.enablement.workspace_disabled(),
        )
    }

    /// Change notifications; one message per observable change
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.inner.changes.subscribe()
    }

    pub fn settings(&self) -> ExtensionsSettings {
        self.inner.settings.borrow().clone()
    }

    pub fn workbench(&self) -> WorkbenchState {
        self.inner.workbench
    }

    pub fn gallery(&self) -> &Arc<dyn GallerySource> {
        &self.inner.gallery
    }

    /// Installed entities, excluding in-flight installs
    pub fn installed(&self) -> Vec<ExtensionEntity> {
        self.state().installed.clone()
    }

    /// Installed entities plus in-flight installs not yet installed
    pub fn local(&self) -> Vec<ExtensionEntity> {
        let state = self.state();
        let mut local = state.installed.clone();
        for op in state.tracker.installing() {
            let id = op.extension.id();
            if !local.iter().any(|e| e.id() == id) {
                local.push(op.extension.clone());
            }
        }
        local
    }

    /// Look up a local entity by id
    pub fn get(&self, id: &str) -> Option<ExtensionEntity> {
        let id = canonical_id(id);
        self.local().into_iter().find(|e| e.id() == id)
    }

    /// Derived lifecycle state of any entity
    pub fn state_of(&self, extension: &ExtensionEntity) -> ExtensionState {
        let state = self.state();
        state.tracker.state_of(extension, &state.installed)
    }

    /// Reload installed extensions, keeping entity handles stable by local id
    pub async fn query_local(&self) -> Result<Vec<ExtensionEntity>> {
        let locals = self
            .inner
            .inventory
            .list_installed()
            .await
            .context("Failed to list installed extensions")?;
        let (globally_disabled, workspace_disabled) = self.disabled_sets();

        {
            let mut state = self.state();
            let mut previous = std::mem::take(&mut state.installed);
            let mut installed = Vec::with_capacity(locals.len());

            for local in locals {
                let existing = previous.iter().position(|e| {
                    e.local()
                        .is_some_and(|l| l.identifier.matches_id(&local.identifier.id))
                });
                let mut entity = match existing {
                    Some(index) => previous.swap_remove(index),
                    None => state.allocate(Facets::Local(local.clone())),
                };
                entity.set_local(local);
                apply_flags(&mut entity, &globally_disabled, &workspace_disabled);
                installed.push(entity);
            }

            debug!("Loaded {} installed extension(s)", installed.len());
            state.installed = installed;
        }

        self.notify_changed();
        Ok(self.local())
    }

    async fn fetch_gallery(&self, query: &GalleryQuery) -> Result<Page<ExtensionEntity>> {
        let page = self.inner.gallery.query(query).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            items.push(self.from_gallery(record).await);
        }

        Ok(Page {
            total: page.total,
            page: query.page,
            page_size: query.page_size,
            items,
        })
    }

    /// Query the gallery. Unreachable-gallery failures yield an empty page.
    pub async fn query_gallery(&self, query: GalleryQuery) -> Result<Page<ExtensionEntity>> {
        match self.fetch_gallery(&query).await {
            Err(e) if e.is_benign() => {
                debug!("Gallery query dropped: {}", e);
                Ok(Page::empty())
            }
            other => other,
        }
    }

    /// Free-text gallery search using the configured page size
    pub async fn search(&self, text: &str, page: usize) -> Result<Page<ExtensionEntity>> {
        let page_size = self.settings().gallery_page_size;
        self.query_gallery(GalleryQuery::text(text, page_size).with_page(page))
            .await
    }

    /// Resolve a gallery record to an entity.
    ///
    /// An installed match (by uuid when both have one, else by id) absorbs the
    /// record and is returned; otherwise a detached gallery-only entity is
    /// created.
    async fn from_gallery(&self, record: GalleryExtension) -> ExtensionEntity {
        let installed = {
            let state = self.state();
            state
                .installed
                .iter()
                .find(|e| e.identifier().matches(&record.identifier))
                .map(|e| e.handle())
        };

        let Some(handle) = installed else {
            return self.state().allocate(Facets::Gallery(record));
        };

        let compatible = if record.properties.engine.is_some() {
            match self.inner.gallery.load_compatible_version(&record).await {
                Ok(compatible) => compatible,
                Err(e) => {
                    debug!("No compatible version of {}: {:#}", record.identifier, e);
                    None
                }
            }
        } else {
            Some(record.clone())
        };

        if let Some(compatible) = compatible {
            self.sync_local_with_gallery(handle, compatible);
        }

        let current = self
            .state()
            .installed
            .iter()
            .find(|e| e.handle() == handle)
            .cloned();
        match current {
            Some(entity) => entity,
            None => self.state().allocate(Facets::Gallery(record)),
        }
    }

    fn sync_local_with_gallery(&self, handle: EntityHandle, gallery: GalleryExtension) {
        {
            let mut state = self.state();
            let Some(entity) = state.installed.iter_mut().find(|e| e.handle() == handle) else {
                return;
            };
            entity.set_gallery(gallery);
        }
        self.notify_changed();
        self.eventually_auto_update();
    }

    /// Dependency tree rooted at `extension`, or `None` when it declares none
    pub async fn load_dependencies(
        &self,
        extension: &ExtensionEntity,
    ) -> Result<Option<Arc<DependencyGraphView>>> {
        if extension.dependencies().is_empty() {
            return Ok(None);
        }

        let mut known = self.local();
        if let Some(record) = extension.gallery() {
            match self.inner.gallery.all_dependencies(record).await {
                Ok(records) => {
                    for record in records {
                        known.push(self.from_gallery(record).await);
                    }
                }
                Err(e) if is_benign(&e) => {
                    debug!("Resolving dependencies from installed extensions only: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let lookup: ExtensionLookup = known.into_iter().map(|e| (e.id(), e)).collect();
        Ok(Some(DependencyGraphView::root(extension.clone(), lookup)))
    }

    /// Start an install. Completion arrives through inventory events.
    pub async fn install(&self, source: InstallSource) -> Result<LocalExtension> {
        match source {
            InstallSource::Gallery(extension) => {
                let record = extension
                    .gallery()
                    .ok_or_else(|| Error::missing_gallery(extension.id()))?;
                info!("Installing {} v{}", extension.id(), record.version);
                Ok(self.inner.inventory.install_from_gallery(record).await?)
            }
            InstallSource::Package(path) => {
                info!("Installing package {}", path);
                Ok(self.inner.inventory.install_package(&path).await?)
            }
        }
    }

    /// Uninstall; the local record is resolved from the installed list if
    /// the given entity lacks one
    pub async fn uninstall(&self, extension: &ExtensionEntity) -> Result<()> {
        let local = match extension.local() {
            Some(local) => local.clone(),
            None => {
                let id = extension.id();
                self.state()
                    .installed
                    .iter()
                    .find(|e| e.id() == id)
                    .and_then(|e| e.local().cloned())
                    .ok_or_else(|| Error::missing_local(extension.id()))?
            }
        };

        info!("Uninstalling {}", local.identifier);
        self.inner.inventory.uninstall(&local).await?;
        Ok(())
    }

    pub async fn readme(&self, extension: &ExtensionEntity) -> Result<String> {
        extension.readme(self.inner.gallery.as_ref()).await
    }

    pub async fn changelog(&self, extension: &ExtensionEntity) -> Result<String> {
        extension.changelog(self.inner.gallery.as_ref()).await
    }

    /// Companion extensions of `id` that are not installed
    pub fn companion_recommendations(&self, id: &str) -> Vec<String> {
        let Some(companions) = &self.inner.companions else {
            return Vec::new();
        };
        let installed: HashSet<String> = self.local().iter().map(|e| e.id()).collect();
        companions
            .companions(&canonical_id(id))
            .iter()
            .map(|c| canonical_id(c))
            .filter(|c| !installed.contains(c))
            .collect()
    }

    /// Resolve `skald://extension/<id>` to an entity.
    ///
    /// Failures are reported through the notifier unless benign; URLs of
    /// other shapes are ignored.
    pub async fn open_url(&self, url: &str) -> Option<ExtensionEntity> {
        let id = parse_extension_url(url)?;
        if let Some(extension) = self.get(&id) {
            return Some(extension);
        }

        match self.fetch_gallery(&GalleryQuery::by_names(vec![id.clone()])).await {
            Ok(page) => {
                let found = page.items.into_iter().next();
                if found.is_none() {
                    self.inner
                        .notifier
                        .show_error(&Error::unknown_extension(id).to_string());
                }
                found
            }
            Err(e) => {
                if !e.is_benign() {
                    self.inner.notifier.show_error(&e.to_string());
                }
                None
            }
        }
    }

    /// Apply one inventory lifecycle event
    pub fn handle_inventory_event(&self, event: InventoryEvent) {
        match event {
            InventoryEvent::InstallStarted { target } => self.on_install_started(target),
            InventoryEvent::InstallCompleted { target, outcome } => {
                self.on_install_completed(target, outcome)
            }
            InventoryEvent::UninstallStarted { identifier } => self.on_uninstall_started(&identifier),
            InventoryEvent::UninstallCompleted { identifier, error } => {
                self.on_uninstall_completed(&identifier, error)
            }
        }
    }

    fn on_install_started(&self, target: InstallTarget) {
        // Package installs are not tracked until they complete
        let InstallTarget::Gallery(record) = target else {
            return;
        };

        {
            let mut state = self.state();
            let found = state
                .installed
                .iter()
                .find(|e| e.identifier().matches(&record.identifier))
                .cloned();
            let mut extension = match found {
                Some(extension) => extension,
                None => state.allocate(Facets::Gallery(record.clone())),
            };
            if extension.gallery().is_none() {
                extension.set_gallery(record);
            }
            debug!("Install started: {}", extension.id());
            state.tracker.start_install(extension);
        }
        self.notify_changed();
    }

    fn on_install_completed(
        &self,
        target: InstallTarget,
        outcome: std::result::Result<LocalExtension, String>,
    ) {
        let (globally_disabled, workspace_disabled) = self.disabled_sets();

        let telemetry = {
            let mut state = self.state();
            let operation = match &target {
                InstallTarget::Gallery(record) => state.tracker.finish_install(record),
                InstallTarget::Package(_) => None,
            };

            let mut extension = match (&operation, &outcome, &target) {
                (Some(op), _, _) => op.extension.clone(),
                (None, Ok(local), InstallTarget::Package(_)) => {
                    state.allocate(Facets::Local(local.clone()))
                }
                _ => {
                    debug!("Ignoring completion of an untracked install");
                    return;
                }
            };

            let mut kind = operation.as_ref().map(|op| op.operation);
            if let Ok(local) = &outcome {
                extension.set_local(local.clone());
                let id = extension.id();
                match state.installed.iter_mut().find(|e| e.id() == id) {
                    Some(installed) => {
                        if kind.is_some() {
                            kind = Some(Operation::Updating);
                        }
                        installed.set_local(local.clone());
                    }
                    None => {
                        apply_flags(&mut extension, &globally_disabled, &workspace_disabled);
                        state.installed.push(extension.clone());
                    }
                }
            }

            match (kind, operation) {
                (Some(kind), Some(op)) if extension.gallery().is_some() => Some(lifecycle_event(
                    kind,
                    &extension,
                    op.elapsed(),
                    outcome.err(),
                )),
                _ => None,
            }
        };

        if let Some(event) = telemetry {
            self.inner.telemetry.log(event);
        }
        self.notify_changed();
    }

    fn on_uninstall_started(&self, identifier: &ExtensionIdentifier) {
        {
            let mut state = self.state();
            let Some(extension) = state.installed_by_local_id(&identifier.id).cloned() else {
                debug!("Uninstall started for unknown extension {}", identifier);
                return;
            };
            state.tracker.start_uninstall(extension);
        }
        self.notify_changed();
    }

    fn on_uninstall_completed(&self, identifier: &ExtensionIdentifier, error: Option<String>) {
        let (changed, telemetry) = {
            let mut state = self.state();
            let before = state.installed.len();
            if error.is_none() {
                state.installed.retain(|e| {
                    !e.local()
                        .is_some_and(|l| l.identifier.matches_id(&identifier.id))
                });
            }
            let removed = state.installed.len() != before;

            match state.tracker.finish_uninstall(identifier) {
                Some(op) => {
                    let event = error.is_none().then(|| {
                        lifecycle_event(Operation::Uninstalling, &op.extension, op.elapsed(), None)
                    });
                    (true, event)
                }
                None => (removed, None),
            }
        };

        if let Some(event) = telemetry {
            self.inner.telemetry.log(event);
        }
        if changed {
            self.notify_changed();
        }
    }

    /// Re-read enablement flags for one identifier
    pub fn handle_enablement_changed(&self, identifier: &ExtensionIdentifier) {
        self.refresh_enablement(std::slice::from_ref(identifier));
    }

    fn refresh_enablement(&self, identifiers: &[ExtensionIdentifier]) {
        let (globally_disabled, workspace_disabled) = self.disabled_sets();
        let changed = {
            let mut state = self.state();
            let mut changed = false;
            for entity in state
                .installed
                .iter_mut()
                .filter(|e| identifiers.iter().any(|id| id.matches(&e.identifier())))
            {
                apply_flags(entity, &globally_disabled, &workspace_disabled);
                changed = true;
            }
            changed
        };
        if changed {
            self.notify_changed();
        }
    }

    /// React to new settings; turning auto-update on triggers an update check
    pub fn handle_settings_changed(&self, settings: &ExtensionsSettings) {
        let was_enabled = self
            .inner
            .auto_update_enabled
            .swap(settings.auto_update, Ordering::SeqCst);
        if settings.auto_update && !was_enabled {
            info!("Auto-update enabled; checking for updates");
            let service = self.clone();
            tokio::spawn(async move {
                if let Err(e) = service.check_for_updates().await {
                    warn!("Update check failed: {}", e);
                }
            });
        }
    }

    /// Spawn listeners for inventory, enablement and settings changes
    pub fn listen(&self) {
        let mut handles = Vec::with_capacity(3);

        let weak = self.downgrade();
        let mut inventory_events = self.inner.inventory.subscribe();
        handles.push(tokio::spawn(async move {
            loop {
                let event = inventory_events.recv().await;
                let Some(service) = Self::upgrade(&weak) else {
                    break;
                };
                match event {
                    Ok(event) => service.handle_inventory_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Missed {} inventory event(s); reloading installed extensions",
                            skipped
                        );
                        if let Err(e) = service.query_local().await {
                            warn!("Failed to reload installed extensions: {}", e);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        let weak = self.downgrade();
        let mut enablement_events = self.inner.enablement.subscribe();
        handles.push(tokio::spawn(async move {
            loop {
                let event = enablement_events.recv().await;
                let Some(service) = Self::upgrade(&weak) else {
                    break;
                };
                match event {
                    Ok(identifier) => service.handle_enablement_changed(&identifier),
                    Err(RecvError::Lagged(_)) => {
                        let all: Vec<ExtensionIdentifier> =
                            service.installed().iter().map(|e| e.identifier()).collect();
                        service.refresh_enablement(&all);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        let weak = self.downgrade();
        let mut settings = self.inner.settings.clone();
        handles.push(tokio::spawn(async move {
            while settings.changed().await.is_ok() {
                let Some(service) = Self::upgrade(&weak) else {
                    break;
                };
                let current = settings.borrow_and_update().clone();
                service.handle_settings_changed(&current);
            }
        }));

        lock(&self.inner.listeners).extend(handles);
    }

    /// Listen for events and run the first gallery sync immediately
    pub fn start(&self) {
        self.listen();
        drop(self.schedule_sync(Duration::ZERO));
    }

    /// Stop listeners and cancel the sync and auto-update timers.
    ///
    /// In-flight installs and uninstalls are left to finish.
    pub fn dispose(&self) {
        self.inner.sync_delayer.cancel();
        self.inner.auto_update_delayer.cancel();
        for handle in lock(&self.inner.listeners).drain(..) {
            handle.abort();
        }
        debug!("Extensions service disposed");
    }
}
