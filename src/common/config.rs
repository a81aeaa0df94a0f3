//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::paths::config_path;
use super::Result;
use crate::bootstrap::DaemonFamily;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Bootstrap settings
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Identity reported by the host application
    #[serde(default)]
    pub application: ApplicationConfig,

    /// System parameters served to the bootstrap
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// Coverage report settings
    #[serde(default)]
    pub coverage: CoverageConfig,
}

/// Bootstrap settings
#[derive(Debug, Deserialize)]
pub struct BootstrapConfig {
    /// Refuse to bootstrap unless the test-mode parameter reads "1"
    #[serde(default = "default_require_test_mode")]
    pub require_test_mode: bool,

    /// System parameter holding the test-mode flag
    #[serde(default = "default_test_mode_parameter")]
    pub test_mode_parameter: String,

    /// Timeout units for `uitest start-daemon`
    #[serde(default = "default_uitest_timeout")]
    pub uitest_timeout_units: u32,

    /// Timeout units for `perftest start-daemon`
    #[serde(default = "default_perftest_timeout")]
    pub perftest_timeout_units: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            require_test_mode: default_require_test_mode(),
            test_mode_parameter: default_test_mode_parameter(),
            uitest_timeout_units: default_uitest_timeout(),
            perftest_timeout_units: default_perftest_timeout(),
        }
    }
}

fn default_require_test_mode() -> bool {
    true
}
fn default_test_mode_parameter() -> String {
    "persist.ace.testmode.enabled".to_string()
}
fn default_uitest_timeout() -> u32 {
    DaemonFamily::UiTest.default_timeout_units()
}
fn default_perftest_timeout() -> u32 {
    DaemonFamily::PerfTest.default_timeout_units()
}

impl BootstrapConfig {
    /// Timeout units configured for a daemon family
    pub fn timeout_units(&self, family: DaemonFamily) -> u32 {
        match family {
            DaemonFamily::UiTest => self.uitest_timeout_units,
            DaemonFamily::PerfTest => self.perftest_timeout_units,
        }
    }
}

/// Application identity settings
#[derive(Debug, Deserialize)]
pub struct ApplicationConfig {
    /// Application name used in the connection token
    #[serde(default = "default_application_name")]
    pub name: String,

    /// Storage area (encryption level) of the application context
    #[serde(default = "default_area")]
    pub area: u32,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_application_name(),
            area: default_area(),
        }
    }
}

fn default_application_name() -> String {
    "testkit".to_string()
}
fn default_area() -> u32 {
    1
}

/// Coverage report settings
#[derive(Debug, Deserialize)]
pub struct CoverageConfig {
    /// Maximum characters per emitted report line
    #[serde(default = "default_chunk_len")]
    pub chunk_len: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            chunk_len: default_chunk_len(),
        }
    }
}

fn default_chunk_len() -> usize {
    crate::report::coverage::DEFAULT_CHUNK_LEN
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.coverage.chunk_len == 0 {
            return Err(super::Error::Config(
                "coverage.chunk_len must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
