//! Common test utilities
//!
//! Shared infrastructure for the integration suite:
//! - cube fixtures and context helpers
//! - mock cell readers with configurable lazy-loading behavior
//! - instrumented calc wrappers and a mock native provider

pub mod cubes;
pub mod mocks;

pub use cubes::*;
pub use mocks::*;
