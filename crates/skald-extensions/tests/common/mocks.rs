//! In-memory collaborators
//!
//! Every mock records how the service drove it so tests can assert on
//! calls without touching the filesystem or network.

#![allow(dead_code)]

use super::builders::installed_from;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use skald_core::error::Error;
use skald_core::types::{
    canonical_id, EnablementScope, ExtensionIdentifier, ExtensionManifest, GalleryExtension,
    LocalExtension,
};
use skald_extensions::{
    CompanionLookup, EnablementStore, GalleryPage, GalleryQuery, GallerySource, InstallTarget,
    InventoryEvent, LocalInventory, Notifier, Severity, TelemetryEvent, TelemetrySink,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

/// Inventory that installs instantly and broadcasts lifecycle events
pub struct MockInventory {
    installed: Mutex<Vec<LocalExtension>>,
    packages: Mutex<HashMap<Utf8PathBuf, LocalExtension>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    events: broadcast::Sender<InventoryEvent>,
}

impl MockInventory {
    pub fn new(installed: Vec<LocalExtension>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            installed: Mutex::new(installed),
            packages: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Make installs of `id` fail
    pub fn fail_installs_of(&self, id: &str) {
        self.failing.lock().unwrap().insert(canonical_id(id));
    }

    /// Register a package that `install_package` can unpack
    pub fn add_package(&self, path: &str, local: LocalExtension) {
        self.packages
            .lock()
            .unwrap()
            .insert(Utf8PathBuf::from(path), local);
    }

    pub fn set_installed(&self, installed: Vec<LocalExtension>) {
        *self.installed.lock().unwrap() = installed;
    }

    pub fn installed_ids(&self) -> Vec<String> {
        self.installed
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.identifier.id.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn emit(&self, event: InventoryEvent) {
        let _ = self.events.send(event);
    }

    fn store(&self, local: &LocalExtension) {
        let mut installed = self.installed.lock().unwrap();
        installed.retain(|l| !l.identifier.matches_id(&local.identifier.id));
        installed.push(local.clone());
    }
}

#[async_trait]
impl LocalInventory for MockInventory {
    async fn list_installed(&self) -> Result<Vec<LocalExtension>> {
        Ok(self.installed.lock().unwrap().clone())
    }

    async fn install_from_gallery(&self, gallery: &GalleryExtension) -> Result<LocalExtension> {
        self.record(format!("install:{}@{}", gallery.identifier.id, gallery.version));
        let target = InstallTarget::Gallery(gallery.clone());
        self.emit(InventoryEvent::InstallStarted {
            target: target.clone(),
        });

        if self.failing.lock().unwrap().contains(&gallery.identifier.id) {
            self.emit(InventoryEvent::InstallCompleted {
                target,
                outcome: Err("download failed".to_string()),
            });
            return Err(anyhow!("download failed"));
        }

        let local = installed_from(gallery);
        self.store(&local);
        self.emit(InventoryEvent::InstallCompleted {
            target,
            outcome: Ok(local.clone()),
        });
        Ok(local)
    }

    async fn install_package(&self, path: &Utf8Path) -> Result<LocalExtension> {
        self.record(format!("package:{}", path));
        let target = InstallTarget::Package(path.to_path_buf());
        self.emit(InventoryEvent::InstallStarted {
            target: target.clone(),
        });

        let local = self
            .packages
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no package at {}", path))?;
        self.store(&local);
        self.emit(InventoryEvent::InstallCompleted {
            target,
            outcome: Ok(local.clone()),
        });
        Ok(local)
    }

    async fn uninstall(&self, local: &LocalExtension) -> Result<()> {
        self.record(format!("uninstall:{}", local.identifier.id));
        self.emit(InventoryEvent::UninstallStarted {
            identifier: local.identifier.clone(),
        });
        self.installed
            .lock()
            .unwrap()
            .retain(|l| !l.identifier.matches_id(&local.identifier.id));
        self.emit(InventoryEvent::UninstallCompleted {
            identifier: local.identifier.clone(),
            error: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.events.subscribe()
    }
}

/// How the mock gallery fails queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryFailure {
    /// DNS-style failure; treated as benign
    Unreachable,
    /// Any other failure
    Broken,
}

/// Gallery serving a fixed set of latest records
pub struct MockGallery {
    records: Mutex<Vec<GalleryExtension>>,
    compatible: Mutex<HashMap<String, Option<GalleryExtension>>>,
    queries: Mutex<Vec<GalleryQuery>>,
    failure: Mutex<Option<GalleryFailure>>,
    query_delay: Mutex<Duration>,
    query_count: AtomicUsize,
}

impl MockGallery {
    pub fn new(records: Vec<GalleryExtension>) -> Self {
        Self {
            records: Mutex::new(records),
            compatible: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            query_delay: Mutex::new(Duration::ZERO),
            query_count: AtomicUsize::new(0),
        }
    }

    pub fn set_records(&self, records: Vec<GalleryExtension>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fail_with(&self, failure: Option<GalleryFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    /// Override what `load_compatible_version` returns for `id`
    pub fn set_compatible(&self, id: &str, compatible: Option<GalleryExtension>) {
        self.compatible
            .lock()
            .unwrap()
            .insert(canonical_id(id), compatible);
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<GalleryQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn find(&self, id: &str) -> Option<GalleryExtension> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.identifier.matches_id(id))
            .cloned()
    }
}

#[async_trait]
impl GallerySource for MockGallery {
    async fn query(&self, query: &GalleryQuery) -> Result<GalleryPage> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(GalleryFailure::Unreachable) => {
                return Err(Error::transient_network("getaddrinfo ENOTFOUND gallery.test").into())
            }
            Some(GalleryFailure::Broken) => return Err(anyhow!("gallery returned HTTP 500")),
            None => {}
        }

        let text = query.text.as_deref().map(str::to_lowercase);
        let matches: Vec<GalleryExtension> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                query.ids.is_empty()
                    || r
                        .identifier
                        .uuid
                        .as_ref()
                        .is_some_and(|u| query.ids.contains(u))
            })
            .filter(|r| {
                query.names.is_empty() || query.names.iter().any(|n| r.identifier.matches_id(n))
            })
            .filter(|r| text.as_deref().map_or(true, |t| r.identifier.id.contains(t)))
            .cloned()
            .collect();

        let total = matches.len();
        let page_size = if query.page_size == 0 { total.max(1) } else { query.page_size };
        let items = matches
            .into_iter()
            .skip(query.page * page_size)
            .take(page_size)
            .collect();
        Ok(GalleryPage { total, items })
    }

    async fn manifest(&self, extension: &GalleryExtension) -> Result<ExtensionManifest> {
        Ok(ExtensionManifest {
            name: extension.name.clone(),
            publisher: extension.publisher.clone(),
            version: extension.version.clone(),
            display_name: extension.display_name.clone(),
            extension_dependencies: extension.properties.dependencies.clone(),
            ..Default::default()
        })
    }

    async fn readme(&self, extension: &GalleryExtension) -> Result<String> {
        match &extension.assets.readme {
            Some(_) => Ok(format!("# {}", extension.identifier.id)),
            None => Err(anyhow!("no readme")),
        }
    }

    async fn changelog(&self, extension: &GalleryExtension) -> Result<String> {
        match &extension.assets.changelog {
            Some(_) => Ok(format!("## {} {}", extension.identifier.id, extension.version)),
            None => Err(anyhow!("no changelog")),
        }
    }

    async fn all_dependencies(
        &self,
        extension: &GalleryExtension,
    ) -> Result<Vec<GalleryExtension>> {
        let mut visited: HashSet<String> = HashSet::from([extension.identifier.id.clone()]);
        let mut stack: Vec<String> = extension.properties.dependencies.clone();
        let mut found = Vec::new();

        while let Some(id) = stack.pop() {
            let id = canonical_id(&id);
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.find(&id) {
                stack.extend(record.properties.dependencies.iter().cloned());
                found.push(record);
            }
        }
        Ok(found)
    }

    async fn load_compatible_version(
        &self,
        extension: &GalleryExtension,
    ) -> Result<Option<GalleryExtension>> {
        let id = canonical_id(&extension.identifier.id);
        match self.compatible.lock().unwrap().get(&id) {
            Some(compatible) => Ok(compatible.clone()),
            None => Ok(Some(extension.clone())),
        }
    }
}

/// One recorded enablement write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnablementWrite {
    pub id: String,
    pub enable: bool,
    pub scope: EnablementScope,
}

impl EnablementWrite {
    pub fn new(id: &str, enable: bool, scope: EnablementScope) -> Self {
        Self {
            id: id.to_string(),
            enable,
            scope,
        }
    }
}

/// Enablement flags held in memory
pub struct MockEnablementStore {
    global: Mutex<Vec<ExtensionIdentifier>>,
    workspace: Mutex<Vec<ExtensionIdentifier>>,
    writes: Mutex<Vec<EnablementWrite>>,
    fail_on: Mutex<Option<String>>,
    changes: broadcast::Sender<ExtensionIdentifier>,
}

impl Default for MockEnablementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnablementStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            global: Mutex::new(Vec::new()),
            workspace: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            changes,
        }
    }

    pub fn disable_globally(&self, id: &str) {
        self.global.lock().unwrap().push(ExtensionIdentifier::new(id));
    }

    pub fn disable_in_workspace(&self, id: &str) {
        self.workspace
            .lock()
            .unwrap()
            .push(ExtensionIdentifier::new(id));
    }

    /// Make every write for `id` fail
    pub fn fail_writes_of(&self, id: &str) {
        *self.fail_on.lock().unwrap() = Some(canonical_id(id));
    }

    pub fn writes(&self) -> Vec<EnablementWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn is_disabled(&self, id: &str, scope: EnablementScope) -> bool {
        let list = match scope {
            EnablementScope::Global => &self.global,
            EnablementScope::Workspace => &self.workspace,
        };
        list.lock().unwrap().iter().any(|d| d.matches_id(id))
    }
}

#[async_trait]
impl EnablementStore for MockEnablementStore {
    fn globally_disabled(&self) -> Vec<ExtensionIdentifier> {
        self.global.lock().unwrap().clone()
    }

    fn workspace_disabled(&self) -> Vec<ExtensionIdentifier> {
        self.workspace.lock().unwrap().clone()
    }

    async fn set_enablement(
        &self,
        identifier: &ExtensionIdentifier,
        enable: bool,
        scope: EnablementScope,
    ) -> Result<bool> {
        if self.fail_on.lock().unwrap().as_deref() == Some(identifier.id.as_str()) {
            return Err(anyhow!("enablement storage is read-only"));
        }
        self.writes
            .lock()
            .unwrap()
            .push(EnablementWrite::new(&identifier.id, enable, scope));

        let list = match scope {
            EnablementScope::Global => &self.global,
            EnablementScope::Workspace => &self.workspace,
        };
        let changed = {
            let mut list = list.lock().unwrap();
            let present = list.iter().any(|d| d.matches(identifier));
            if enable && present {
                list.retain(|d| !d.matches(identifier));
                true
            } else if !enable && !present {
                list.push(identifier.clone());
                true
            } else {
                false
            }
        };
        if changed {
            let _ = self.changes.send(identifier.clone());
        }
        Ok(changed)
    }

    fn subscribe(&self) -> broadcast::Receiver<ExtensionIdentifier> {
        self.changes.subscribe()
    }
}

/// One prompt shown through [`ScriptedNotifier`]
#[derive(Debug, Clone)]
pub struct Prompt {
    pub severity: Severity,
    pub message: String,
    pub options: Vec<String>,
    pub default: usize,
}

/// Notifier answering prompts from a script; unscripted prompts are dismissed
#[derive(Default)]
pub struct ScriptedNotifier {
    answers: Mutex<VecDeque<Option<usize>>>,
    prompts: Mutex<Vec<Prompt>>,
    errors: Mutex<Vec<String>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, choice: Option<usize>) {
        self.answers.lock().unwrap().push_back(choice);
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn choose(
        &self,
        severity: Severity,
        message: &str,
        options: &[&str],
        default: usize,
    ) -> Option<usize> {
        self.prompts.lock().unwrap().push(Prompt {
            severity,
            message: message.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            default,
        });
        self.answers.lock().unwrap().pop_front().flatten()
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Telemetry sink that keeps every event
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Fixed companion table
#[derive(Default)]
pub struct StaticCompanions(pub HashMap<String, Vec<String>>);

impl StaticCompanions {
    pub fn with(mut self, id: &str, companions: &[&str]) -> Self {
        self.0.insert(
            canonical_id(id),
            companions.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

impl CompanionLookup for StaticCompanions {
    fn companions(&self, id: &str) -> Vec<String> {
        self.0.get(id).cloned().unwrap_or_default()
    }
}
