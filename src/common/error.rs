//! Error types for testkit
//!
//! The bootstrap path never returns these across `setup`/`teardown`; they are
//! produced by host capabilities and the report/CLI helpers, then logged or
//! converted into outcomes.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for testkit
#[derive(Error, Debug)]
pub enum Error {
    // === Capability Errors ===
    #[error("Capability '{0}' is not available from any provider namespace")]
    CapabilityUnavailable(String),

    #[error("No test module loaded for {0}")]
    ModuleNotLoaded(String),

    // === Shell Errors ===
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Report Errors ===
    #[error("Invalid mock list: {0}")]
    MockList(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error for `path`
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
