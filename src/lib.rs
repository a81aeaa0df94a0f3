//! testkit - test tooling around UI and performance automation daemons
//!
//! The core is the client bootstrap in [`bootstrap`]: it resolves host
//! capabilities, derives a connection token, schedules the module's
//! connection and launches the daemon on demand. [`report`] and
//! [`matchers`] carry the smaller test-kit helpers.

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod common;
pub mod host;
pub mod matchers;
pub mod report;

// Re-export commonly used types for tests
pub use bootstrap::{ConnectionToken, DaemonFamily, LifecycleHooks, TestEnvironment};
pub use common::{Error, Result};
