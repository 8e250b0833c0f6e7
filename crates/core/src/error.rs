//! Device error types

use std::io;

use thiserror::Error;

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors surfaced synchronously by configuration and lifecycle calls
///
/// Data-loss and missed-interrupt conditions are deliberately *not* errors:
/// they are reported as `tracing` warnings and reflected in the returned
/// byte counts, because forward progress is preferred over strict
/// accounting.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Operation requires the opposite lifecycle state
    #[error("device is busy: {0}")]
    Busy(&'static str),

    /// Out-of-range or malformed configuration value
    #[error("invalid {field}: {message}")]
    InvalidArgument {
        /// Configuration field that was rejected
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Destination could not be opened on start
    #[error("failed to open sink '{path}': {source}")]
    SinkUnavailable {
        /// Destination path that failed to open
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The interrupt adapter refused the configured line on start
    #[error("failed to register interrupt line {line}: {message}")]
    InterruptRegistrationFailed {
        /// The rejected line id
        line: u32,
        /// Adapter-reported reason
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeviceError::Busy("device is already running");
        assert!(err.to_string().contains("busy"));

        let err = DeviceError::InvalidArgument {
            field: "chunk_size",
            message: "must be greater than zero".into(),
        };
        assert!(err.to_string().contains("chunk_size"));

        let err = DeviceError::SinkUnavailable {
            path: "/no/such/dir/out".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/no/such/dir/out"));

        let err = DeviceError::InterruptRegistrationFailed {
            line: 42,
            message: "line not available".into(),
        };
        assert!(err.to_string().contains("42"));
    }
}
