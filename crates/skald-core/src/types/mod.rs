//! Type definitions for Skald

mod extension_types;
mod identifier;
mod settings_types;

pub use extension_types::*;
pub use identifier::*;
pub use settings_types::*;
