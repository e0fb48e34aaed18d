//! # skald-core
//!
//! Core library for Skald providing:
//! - Extension identifiers and the local/gallery record types
//! - Semantic version comparison used for update detection
//! - Settings loading with layered precedence
//! - The error taxonomy shared by every Skald crate

pub mod config;
pub mod error;
pub mod types;
pub mod version;

pub use config::{SettingsLoader, SkaldPaths};
pub use error::{Error, Result};
pub use types::ExtensionIdentifier;
