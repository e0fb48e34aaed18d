//! Common test utilities for skald-extensions
//!
//! - Record builders for local and gallery fixtures
//! - In-memory collaborators that record how the service drives them
//! - A harness wiring the mocks into an `ExtensionsService`

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::*;
pub use fixtures::*;
pub use mocks::*;
