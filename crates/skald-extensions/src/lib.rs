//! Extension management for Skald
//!
//! This crate handles:
//! - Merging installed and gallery records into one extension entity
//! - Tracking in-flight install/uninstall operations and deriving state
//! - Lazy, cycle-guarded dependency graphs
//! - Enable/disable across dependencies with workspace vs global scope
//! - Periodic gallery sync and auto-update sweeps
//! - File-backed inventory, gallery registry and enablement store
//! - Telemetry events and the JSONL telemetry ledger

pub mod entity;
pub mod events;
pub mod graph;
pub mod ledger;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod tracker;
pub mod traits;

pub use entity::{EntityHandle, ExtensionEntity, Facets, TelemetryData};
pub use events::{EventEnvelope, TelemetryEvent};
pub use graph::{dependency_closure, DependencyGraphView};
pub use ledger::{TelemetryLedger, TracingTelemetry};
pub use scheduler::ThrottledDelayer;
pub use service::{EnablementOutcome, ExtensionsService, InstallSource, Page, ServiceBuilder};
pub use store::{FileEnablementStore, ManifestInventory, RegistryGallery};
pub use tracker::{ActiveOperation, ExtensionState, Operation, OperationTracker};
pub use traits::{
    CompanionLookup, EnablementStore, GalleryPage, GalleryQuery, GallerySource, InstallTarget,
    InventoryEvent, LocalInventory, Notifier, Severity, TelemetrySink,
};
