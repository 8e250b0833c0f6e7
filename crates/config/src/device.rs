//! Device configuration section

use std::path::PathBuf;
use std::time::Duration;

use gih_core::{DeviceConfig, DEFAULT_BUFFER_CAPACITY, MAX_PATH_LEN};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default per-drain byte limit
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default cap on bytes returned by one log-ring read (1 MiB)
const DEFAULT_LOG_READ_MAX: usize = 1 << 20;

/// The `[device]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSection {
    /// Interrupt line to register; on this host, a raw Unix signal number
    pub interrupt_line: Option<u32>,

    /// Delay between an interrupt and the sink write, in milliseconds
    pub delay_ms: u64,

    /// Bytes forwarded per drain
    pub chunk_size: usize,

    /// Destination file path
    pub path: Option<String>,

    /// `true` preserves unflushed backlog across writes (dropping only
    /// overflow); `false` lets each write supersede the backlog
    pub keep_backlog: bool,

    /// Data buffer capacity in bytes
    pub buffer_capacity: usize,

    /// Directory receiving the three log-ring dumps on shutdown; no dump
    /// when unset
    pub log_dump_dir: Option<PathBuf>,

    /// Cap on the formatted bytes returned by one log-ring read
    pub log_read_max: usize,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            interrupt_line: None,
            delay_ms: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            path: None,
            keep_backlog: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            log_dump_dir: None,
            log_read_max: DEFAULT_LOG_READ_MAX,
        }
    }
}

impl DeviceSection {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.interrupt_line.is_none() {
            return Err(ConfigError::MissingField {
                field: "device.interrupt_line",
            });
        }
        let Some(path) = &self.path else {
            return Err(ConfigError::MissingField {
                field: "device.path",
            });
        };
        if path.is_empty() || path.len() > MAX_PATH_LEN {
            return Err(ConfigError::InvalidValue {
                field: "device.path",
                message: format!("length must be 1..={MAX_PATH_LEN} bytes"),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "device.chunk_size",
                message: "must be greater than zero".into(),
            });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "device.buffer_capacity",
                message: "must be greater than zero".into(),
            });
        }
        if self.log_read_max == 0 {
            return Err(ConfigError::InvalidValue {
                field: "device.log_read_max",
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Convert to the device's configuration snapshot
    pub fn to_device_config(&self) -> DeviceConfig {
        DeviceConfig {
            interrupt_line: self.interrupt_line,
            delay: Duration::from_millis(self.delay_ms),
            chunk_size: self.chunk_size,
            destination_path: self.path.clone(),
            keep_backlog: self.keep_backlog,
        }
    }
}
