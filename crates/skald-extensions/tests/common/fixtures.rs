//! Service harness wiring the in-memory collaborators together

#![allow(dead_code)]

use super::mocks::*;
use skald_core::types::{ExtensionsSettings, GalleryExtension, LocalExtension, WorkbenchState};
use skald_extensions::{ExtensionEntity, ExtensionsService, ServiceBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Settings with background auto-update switched off
pub fn quiet_settings() -> ExtensionsSettings {
    ExtensionsSettings {
        auto_update: false,
        ..Default::default()
    }
}

/// A service plus handles on every mock behind it
pub struct Harness {
    pub service: ExtensionsService,
    pub inventory: Arc<MockInventory>,
    pub gallery: Arc<MockGallery>,
    pub enablement: Arc<MockEnablementStore>,
    pub notifier: Arc<ScriptedNotifier>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub settings: watch::Sender<ExtensionsSettings>,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Installed entity by id; panics when absent
    pub fn entity(&self, id: &str) -> ExtensionEntity {
        self.service
            .get(id)
            .unwrap_or_else(|| panic!("{} is not installed", id))
    }

    /// Poll until `condition` holds or the timeout elapses
    pub async fn wait_until(&self, condition: impl Fn(&Harness) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline {
            if condition(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition(self)
    }
}

pub struct HarnessBuilder {
    installed: Vec<LocalExtension>,
    gallery: Vec<GalleryExtension>,
    enablement: MockEnablementStore,
    workbench: WorkbenchState,
    settings: ExtensionsSettings,
    companions: Option<StaticCompanions>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            installed: Vec::new(),
            gallery: Vec::new(),
            enablement: MockEnablementStore::new(),
            workbench: WorkbenchState::Empty,
            settings: quiet_settings(),
            companions: None,
        }
    }
}

impl HarnessBuilder {
    pub fn installed(mut self, installed: Vec<LocalExtension>) -> Self {
        self.installed = installed;
        self
    }

    pub fn gallery(mut self, records: Vec<GalleryExtension>) -> Self {
        self.gallery = records;
        self
    }

    pub fn enablement(mut self, store: MockEnablementStore) -> Self {
        self.enablement = store;
        self
    }

    pub fn workbench(mut self, workbench: WorkbenchState) -> Self {
        self.workbench = workbench;
        self
    }

    pub fn settings(mut self, settings: ExtensionsSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn companions(mut self, companions: StaticCompanions) -> Self {
        self.companions = Some(companions);
        self
    }

    /// Build the service and load the installed extensions
    pub async fn build(self) -> Harness {
        let inventory = Arc::new(MockInventory::new(self.installed));
        let gallery = Arc::new(MockGallery::new(self.gallery));
        let enablement = Arc::new(self.enablement);
        let notifier = Arc::new(ScriptedNotifier::new());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let (settings, settings_rx) = watch::channel(self.settings);

        let mut builder = ServiceBuilder::new(
            inventory.clone(),
            gallery.clone(),
            enablement.clone(),
            notifier.clone(),
        )
        .telemetry(telemetry.clone())
        .workbench(self.workbench)
        .settings(settings_rx);
        if let Some(companions) = self.companions {
            builder = builder.companions(Arc::new(companions));
        }

        let service = builder.build();
        service
            .query_local()
            .await
            .expect("loading installed extensions");

        Harness {
            service,
            inventory,
            gallery,
            enablement,
            notifier,
            telemetry,
            settings,
        }
    }
}
