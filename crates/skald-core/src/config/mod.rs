//! Configuration loading

mod loader;
mod paths;

pub use loader::SettingsLoader;
pub use paths::SkaldPaths;
