//! Drain worker - the deferred half of the interrupt handler
//!
//! One worker task per running device consumes the drain-job queue strictly
//! in arrival order, one job at a time. Each job moves at most one chunk
//! from the data buffer to the sink after the configured delay, then
//! records one drain-start and one drain-end log entry. Jobs are queued
//! unconditionally per interrupt - no coalescing - so a backlog of jobs
//! builds up if interrupts arrive faster than `delay + transfer time`.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::device::{DeviceCounters, Transfer};
use crate::log::LogSet;

/// One scheduled drain. Carries no payload; the buffer is the state.
pub(crate) struct DrainJob;

/// Fixed correction subtracted from the configured delay to account for
/// scheduling overhead, clamped so the wait never goes negative.
const DELAY_CORRECTION: Duration = Duration::from_micros(100);

pub(crate) struct DrainWorker {
    pub(crate) rx: mpsc::UnboundedReceiver<DrainJob>,
    pub(crate) transfer: Arc<Mutex<Transfer>>,
    pub(crate) logs: Arc<LogSet>,
    pub(crate) counters: Arc<DeviceCounters>,
    pub(crate) delay: Duration,
    pub(crate) chunk_size: usize,
}

impl DrainWorker {
    /// Consume the job queue until every sender is dropped
    ///
    /// `Device::stop` relies on this exit condition: after unregistering
    /// the interrupt it drops the senders and joins this task, so every
    /// already-queued drain still completes before the sink is closed.
    pub(crate) async fn run(mut self) {
        while self.rx.recv().await.is_some() {
            self.drain_once().await;
        }
        tracing::debug!("drain worker exiting");
    }

    async fn drain_once(&mut self) {
        let entered = Utc::now();
        let out;
        {
            let mut transfer = self.transfer.lock().await;
            let n = transfer.buffer.len().min(self.chunk_size);

            // Simulates external timing/back-pressure between the interrupt
            // and the moment the destination may be written.
            let wait = self.delay.saturating_sub(DELAY_CORRECTION);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            out = transfer.write_to_sink(n).await;
            transfer.outstanding.fetch_sub(out, Ordering::Relaxed);

            if let Some(sink) = transfer.sink.as_mut() {
                if let Err(error) = sink.sync().await {
                    tracing::warn!(%error, "sink sync failed after drain");
                }
            }
        }

        self.counters.record_drain(out as u64);
        self.logs.drain_start.append_at(entered, -1);
        self.logs.drain_end.append(out as i64);
        tracing::debug!(bytes = out, "drain complete");
    }
}
