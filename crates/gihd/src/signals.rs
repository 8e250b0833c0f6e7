//! Unix-signal interrupt controller
//!
//! The hosted stand-in for a hardware interrupt line: the configured line
//! id is treated as a raw Unix signal number, and every delivered signal
//! fires the device's interrupt handle. `SIGUSR1`/`SIGUSR2` (10/12 on
//! Linux) are the practical choices.

use gih_core::{DeviceError, InterruptController, InterruptGuard, InterruptHandle, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Interrupt controller backed by Unix signals
///
/// Must be used from within a tokio runtime; registration installs the
/// process-wide signal handler and spawns a listener task per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalInterrupts;

impl InterruptController for SignalInterrupts {
    fn register(&self, line: u32, handle: InterruptHandle) -> Result<Box<dyn InterruptGuard>> {
        let kind = SignalKind::from_raw(line as i32);
        let mut stream =
            signal(kind).map_err(|error| DeviceError::InterruptRegistrationFailed {
                line,
                message: error.to_string(),
            })?;

        let token = CancellationToken::new();
        let listener_token = token.clone();
        tokio::spawn(async move {
            // the handle is dropped when this task exits, which lets the
            // device's stop() join its drain worker
            loop {
                tokio::select! {
                    _ = listener_token.cancelled() => break,
                    received = stream.recv() => match received {
                        Some(()) => handle.fire(),
                        None => break,
                    },
                }
            }
            tracing::debug!(line, "signal listener stopped");
        });

        tracing::info!(line, "interrupt line registered as unix signal");
        Ok(Box::new(SignalGuard { token }))
    }
}

struct SignalGuard {
    token: CancellationToken,
}

impl InterruptGuard for SignalGuard {}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        // stops the listener; the process-wide handler installed by tokio
        // stays, but nothing fires the device anymore
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gih_core::{Device, DeviceError};
    use gih_sinks::MemorySinkOpener;

    use super::*;

    #[tokio::test]
    async fn test_bogus_signal_number_fails_registration() {
        let opener = Arc::new(MemorySinkOpener::new());
        let device = Device::new(opener, Arc::new(SignalInterrupts));

        device.set_interrupt_line(99_999).await.unwrap();
        device.set_destination_path("/dev/null").await.unwrap();

        let err = device.start().await.unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InterruptRegistrationFailed { line: 99_999, .. }
        ));
        assert!(!device.running().await);
    }
}
