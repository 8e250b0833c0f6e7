//! GIH daemon configuration
//!
//! TOML-based configuration loading with sensible defaults; only the
//! interrupt line and the destination path have no default and must be
//! given.
//!
//! # Example minimal config
//!
//! ```toml
//! [device]
//! interrupt_line = 10
//! path = "/var/lib/gih/drain.out"
//! ```
//!
//! # Example full config
//!
//! ```toml
//! [device]
//! interrupt_line = 10
//! delay_ms = 5
//! chunk_size = 4096
//! path = "/var/lib/gih/drain.out"
//! keep_backlog = true
//! buffer_capacity = 1048576
//! log_dump_dir = "/var/lib/gih/logs"
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod device;
mod error;
mod logging;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use device::DeviceSection;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Device tunables
    pub device: DeviceSection,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// `FromStr` only checks TOML shape; this checks the values the device
    /// would otherwise reject at configure/start time, so mistakes surface
    /// with the file name instead of mid-lifecycle.
    pub fn validate(&self) -> Result<()> {
        self.device.validate()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod config_test;
