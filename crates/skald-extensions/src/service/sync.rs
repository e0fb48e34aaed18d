//! Gallery sync and auto-update scheduling

use super::{lock, ExtensionsService, InstallSource};
use crate::entity::ExtensionEntity;
use crate::tracker::ExtensionState;
use crate::traits::GalleryQuery;
use futures::future::{join_all, BoxFuture};
use skald_core::error::{Error, Result};
use skald_core::types::ExtensionType;
use std::time::Duration;
use tracing::{debug, info, warn};

impl ExtensionsService {
    /// Sync installed extensions with the gallery now.
    ///
    /// Concurrent calls coalesce into one sync; all of them resolve when
    /// it finishes. Unreachable-gallery failures are not reported.
    pub async fn check_for_updates(&self) -> Result<()> {
        self.schedule_sync(Duration::ZERO).await;
        match lock(&self.inner.last_sync_error).clone() {
            Some(message) => Err(Error::Other(anyhow::anyhow!(message))),
            None => Ok(()),
        }
    }

    /// Schedule a sync on the periodic timer. Each run re-arms the timer
    /// with the configured interval.
    pub(super) fn schedule_sync(&self, delay: Duration) -> BoxFuture<'static, ()> {
        let weak = self.downgrade();
        let completion = self.inner.sync_delayer.trigger(delay, move || {
            let weak = weak.clone();
            async move {
                if let Some(service) = Self::upgrade(&weak) {
                    service.run_scheduled_sync().await;
                }
            }
        });
        Box::pin(completion)
    }

    /// Re-arm the periodic timer without delaying a sync already queued
    /// by a caller during the current run
    fn rearm_sync(&self, interval: Duration) {
        let weak = self.downgrade();
        drop(self.inner.sync_delayer.trigger_no_later_than(interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(service) = Self::upgrade(&weak) {
                    service.run_scheduled_sync().await;
                }
            }
        }));
    }

    async fn run_scheduled_sync(&self) {
        let outcome = self.sync_with_gallery().await;
        let error = match outcome {
            Ok(()) => None,
            Err(e) if e.is_benign() => {
                debug!("Gallery sync skipped: {}", e);
                None
            }
            Err(e) => {
                warn!("Gallery sync failed: {}", e);
                Some(e.to_string())
            }
        };
        *lock(&self.inner.last_sync_error) = error;

        let interval = self.settings().sync_interval();
        self.rearm_sync(interval);
    }

    /// Refresh gallery facets of installed user extensions, querying by
    /// uuid where known and by id otherwise
    async fn sync_with_gallery(&self) -> Result<()> {
        let (uuids, names) = {
            let state = self.state();
            let mut uuids = Vec::new();
            let mut names = Vec::new();
            for extension in state
                .installed
                .iter()
                .filter(|e| e.kind() == ExtensionType::User)
            {
                match extension.uuid() {
                    Some(uuid) => uuids.push(uuid),
                    None => names.push(extension.id()),
                }
            }
            (uuids, names)
        };

        debug!(
            "Syncing {} extension(s) with the gallery",
            uuids.len() + names.len()
        );

        if !uuids.is_empty() {
            self.fetch_gallery(&GalleryQuery::by_uuids(uuids)).await?;
        }
        if !names.is_empty() {
            self.fetch_gallery(&GalleryQuery::by_names(names)).await?;
        }

        self.eventually_auto_update();
        Ok(())
    }

    /// Schedule an auto-update sweep after the configured delay
    pub(super) fn eventually_auto_update(&self) {
        let weak = self.downgrade();
        let delay = self.settings().auto_update_delay();
        drop(self.inner.auto_update_delayer.trigger(delay, move || {
            let weak = weak.clone();
            async move {
                if let Some(service) = Self::upgrade(&weak) {
                    service.auto_update().await;
                }
            }
        }));
    }

    /// Reinstall every idle, outdated extension from its gallery record
    async fn auto_update(&self) {
        if !self.settings().auto_update {
            return;
        }

        let outdated: Vec<ExtensionEntity> = {
            let state = self.state();
            state
                .installed
                .iter()
                .filter(|e| {
                    e.outdated()
                        && state.tracker.state_of(e, &state.installed) == ExtensionState::Installed
                })
                .cloned()
                .collect()
        };
        if outdated.is_empty() {
            return;
        }

        info!("Auto-updating {} extension(s)", outdated.len());
        let updates = outdated.into_iter().map(|extension| async move {
            let id = extension.id();
            let result = self.install(InstallSource::Gallery(extension)).await;
            (id, result)
        });

        for (id, result) in join_all(updates).await {
            if let Err(e) = result {
                warn!("Auto-update of {} failed: {}", id, e);
            }
        }
    }
}
