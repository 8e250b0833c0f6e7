//! Interrupt-context capability and the interrupt-line adapter
//!
//! [`InterruptHandle`] is the only surface the interrupt context gets: it
//! can append one log record and queue one drain job, and neither operation
//! blocks. The raw interrupt-line registration itself is an external
//! service behind [`InterruptController`]; the daemon maps lines to Unix
//! signals, tests use [`ManualInterrupts`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::device::DeviceCounters;
use crate::error::Result;
use crate::log::LogSet;
use crate::worker::DrainJob;

/// Restricted capability handed to the interrupt context
///
/// Cloneable so an adapter can move it into its listener; every clone must
/// be dropped once the registration guard is dropped, or `Device::stop`
/// will wait on the drain worker forever (the worker exits only when all
/// job senders are gone).
#[derive(Clone)]
pub struct InterruptHandle {
    logs: Arc<LogSet>,
    drain_tx: mpsc::UnboundedSender<DrainJob>,
    counters: Arc<DeviceCounters>,
}

impl InterruptHandle {
    pub(crate) fn new(
        logs: Arc<LogSet>,
        drain_tx: mpsc::UnboundedSender<DrainJob>,
        counters: Arc<DeviceCounters>,
    ) -> Self {
        Self {
            logs,
            drain_tx,
            counters,
        }
    }

    /// Record one interrupt and schedule one drain
    ///
    /// Non-blocking: the log append is a short mutex push and the schedule
    /// is an unbounded-channel send. If the drain worker is gone the
    /// interrupt is counted as missed and reported as a warning; the data
    /// stays buffered for the next successful schedule.
    pub fn fire(&self) {
        self.logs.interrupt.append(-1);
        self.counters.record_interrupt();
        if self.drain_tx.send(DrainJob).is_err() {
            self.counters.record_missed_interrupt();
            tracing::warn!("interrupt missed: no drain worker to schedule");
        }
    }
}

/// Registers an interrupt handler on a line
///
/// Abstract service consumed by `Device::start`; the raw registration call
/// is outside this crate's scope.
pub trait InterruptController: Send + Sync {
    /// Register `handle` on `line`
    ///
    /// Every external interrupt observed on the line must invoke
    /// [`InterruptHandle::fire`]. Dropping the returned guard unregisters
    /// the line and must release the handle (and any clones) promptly.
    fn register(&self, line: u32, handle: InterruptHandle) -> Result<Box<dyn InterruptGuard>>;
}

/// Active interrupt registration; dropping it unregisters the line
pub trait InterruptGuard: Send {}

/// Manually fired interrupt controller
///
/// Holds the most recently registered handle and lets the caller fire it
/// directly. This is how the tests stand in for a real interrupt line.
#[derive(Default)]
pub struct ManualInterrupts {
    slot: Arc<Mutex<Option<InterruptHandle>>>,
}

impl ManualInterrupts {
    /// Create a controller, ready to be shared with a device
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fire the registered handle, if any; returns whether one was present
    pub fn fire(&self) -> bool {
        match self.slot.lock().as_ref() {
            Some(handle) => {
                handle.fire();
                true
            }
            None => false,
        }
    }

    /// Whether a handle is currently registered
    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl InterruptController for ManualInterrupts {
    fn register(&self, _line: u32, handle: InterruptHandle) -> Result<Box<dyn InterruptGuard>> {
        *self.slot.lock() = Some(handle);
        Ok(Box::new(ManualGuard {
            slot: Arc::clone(&self.slot),
        }))
    }
}

struct ManualGuard {
    slot: Arc<Mutex<Option<InterruptHandle>>>,
}

impl InterruptGuard for ManualGuard {}

impl Drop for ManualGuard {
    fn drop(&mut self) {
        self.slot.lock().take();
    }
}
