//! The GIH device: configuration state machine, write path, lifecycle
//!
//! A `Device` is the single process-wide instance of the engine. Two mutual
//! exclusion domains serialize access:
//!
//! - the **open lock** (`control`) guards configuration fields and the
//!   Idle/Running transition;
//! - the **write lock** (`transfer`) guards the data buffer and the sink,
//!   shared between the write path, the drain worker, and stop.
//!
//! Configuration is immutable while Running: every `set_*` call returns
//! [`DeviceError::Busy`] instead of blocking. The write path is open in
//! both states - data may be buffered before the device starts, though a
//! successful start resets the buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::buffer::ByteRing;
use crate::error::{DeviceError, Result};
use crate::interrupt::{InterruptController, InterruptGuard, InterruptHandle};
use crate::log::{LogKind, LogSet};
use crate::sink::{Sink, SinkOpener};
use crate::worker::{DrainJob, DrainWorker};
use crate::{DEFAULT_BUFFER_CAPACITY, MAX_PATH_LEN};

/// Configuration snapshot, applied field-by-field while Idle
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Interrupt line id handed to the controller on start
    pub interrupt_line: Option<u32>,
    /// Wait between a drain job starting and the sink write
    pub delay: Duration,
    /// Upper bound on bytes transferred per drain
    pub chunk_size: usize,
    /// Destination path opened on start
    pub destination_path: Option<String>,
    /// Loss policy: `true` preserves backlog across writes and drops only
    /// overflow; `false` lets each write supersede unflushed backlog
    pub keep_backlog: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            interrupt_line: None,
            delay: Duration::ZERO,
            chunk_size: 4096,
            destination_path: None,
            keep_backlog: false,
        }
    }
}

/// Counter snapshot returned by [`Device::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Interrupts caught since construction
    pub interrupts: u64,
    /// Interrupts that failed to schedule a drain
    pub missed_interrupts: u64,
    /// Drain-worker invocations completed
    pub drains: u64,
    /// Bytes delivered to the sink, by drains or the stop-time flush
    pub bytes_drained: u64,
    /// Bytes dropped by the loss policy, overflow, or a failed final flush
    pub bytes_dropped: u64,
    /// Bytes currently buffered but not yet drained
    pub outstanding: usize,
}

/// Shared atomic counters behind [`DeviceStats`]
#[derive(Debug, Default)]
pub(crate) struct DeviceCounters {
    interrupts: AtomicU64,
    missed_interrupts: AtomicU64,
    drains: AtomicU64,
    bytes_drained: AtomicU64,
    bytes_dropped: AtomicU64,
}

impl DeviceCounters {
    #[inline]
    pub(crate) fn record_interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_missed_interrupt(&self) {
        self.missed_interrupts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_drain(&self, bytes: u64) {
        self.drains.fetch_add(1, Ordering::Relaxed);
        self.bytes_drained.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Stop-time flush: bytes reach the sink without a worker invocation
    #[inline]
    fn record_flush(&self, bytes: u64) {
        self.bytes_drained.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self, bytes: u64) {
        self.bytes_dropped.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// State guarded by the write lock
pub(crate) struct Transfer {
    pub(crate) buffer: ByteRing,
    pub(crate) sink: Option<Box<dyn Sink>>,
    /// Mirrors `buffer.len()`; mutated only under the write lock, read
    /// lock-free by [`Device::outstanding`]
    pub(crate) outstanding: Arc<AtomicUsize>,
}

impl Transfer {
    /// Move up to `n` buffered bytes into the sink, FIFO order
    ///
    /// Consumes from the buffer only what the sink actually accepted, so
    /// the outstanding counter keeps matching the buffer length even on a
    /// short write. Returns the bytes delivered; a short or failed write is
    /// reported as a warning, never an error - the device stays Running.
    pub(crate) async fn write_to_sink(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let Some(sink) = self.sink.as_mut() else {
            return 0;
        };

        let mut chunk = vec![0u8; n];
        let staged = self.buffer.peek_into(&mut chunk);
        match sink.write(&chunk[..staged]).await {
            Ok(out) => {
                self.buffer.advance(out);
                if out < staged {
                    tracing::warn!(
                        requested = staged,
                        written = out,
                        "sink accepted fewer bytes than requested"
                    );
                }
                out
            }
            Err(error) => {
                tracing::warn!(%error, bytes = staged, "sink write failed, data stays buffered");
                0
            }
        }
    }
}

/// Running-state resources, present iff the device is Running
struct Runtime {
    irq_guard: Box<dyn InterruptGuard>,
    drain_tx: mpsc::UnboundedSender<DrainJob>,
    worker: JoinHandle<()>,
}

/// State guarded by the open lock
struct Control {
    config: DeviceConfig,
    runtime: Option<Runtime>,
}

impl Control {
    fn running(&self) -> bool {
        self.runtime.is_some()
    }
}

/// The generic interrupt-handled drain device
///
/// Construct once with a sink opener and an interrupt controller, then
/// share via `Arc`. See the crate docs for the full lifecycle.
pub struct Device {
    control: Mutex<Control>,
    transfer: Arc<Mutex<Transfer>>,
    outstanding: Arc<AtomicUsize>,
    /// Read by the write path without taking the open lock; written only
    /// while Idle
    keep_backlog: AtomicBool,
    logs: Arc<LogSet>,
    counters: Arc<DeviceCounters>,
    opener: Arc<dyn SinkOpener>,
    interrupts: Arc<dyn InterruptController>,
}

impl Device {
    /// Create a device with the default 1 MiB buffer
    pub fn new(opener: Arc<dyn SinkOpener>, interrupts: Arc<dyn InterruptController>) -> Self {
        Self::with_buffer_capacity(opener, interrupts, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a device with an explicit buffer capacity
    pub fn with_buffer_capacity(
        opener: Arc<dyn SinkOpener>,
        interrupts: Arc<dyn InterruptController>,
        capacity: usize,
    ) -> Self {
        let outstanding = Arc::new(AtomicUsize::new(0));
        Self {
            control: Mutex::new(Control {
                config: DeviceConfig::default(),
                runtime: None,
            }),
            transfer: Arc::new(Mutex::new(Transfer {
                buffer: ByteRing::new(capacity),
                sink: None,
                outstanding: Arc::clone(&outstanding),
            })),
            outstanding,
            keep_backlog: AtomicBool::new(false),
            logs: Arc::new(LogSet::new()),
            counters: Arc::new(DeviceCounters::default()),
            opener,
            interrupts,
        }
    }

    /// Set the interrupt line to register on start. Idle only.
    pub async fn set_interrupt_line(&self, line: u32) -> Result<()> {
        let mut control = self.idle_control("cannot configure interrupt line").await?;
        control.config.interrupt_line = Some(line);
        tracing::debug!(line, "interrupt line configured");
        Ok(())
    }

    /// Set the drain delay. Idle only.
    pub async fn set_delay(&self, delay: Duration) -> Result<()> {
        let mut control = self.idle_control("cannot configure delay").await?;
        control.config.delay = delay;
        tracing::debug!(delay_ms = delay.as_millis() as u64, "delay configured");
        Ok(())
    }

    /// Set the per-drain byte limit. Idle only; must be positive.
    pub async fn set_chunk_size(&self, chunk_size: usize) -> Result<()> {
        let mut control = self.idle_control("cannot configure chunk size").await?;
        if chunk_size == 0 {
            return Err(DeviceError::InvalidArgument {
                field: "chunk_size",
                message: "must be greater than zero".into(),
            });
        }
        control.config.chunk_size = chunk_size;
        tracing::debug!(chunk_size, "chunk size configured");
        Ok(())
    }

    /// Set the destination path. Idle only; bounded length.
    pub async fn set_destination_path(&self, path: &str) -> Result<()> {
        let mut control = self.idle_control("cannot configure destination path").await?;
        if path.is_empty() || path.len() > MAX_PATH_LEN {
            return Err(DeviceError::InvalidArgument {
                field: "destination_path",
                message: format!("length must be 1..={MAX_PATH_LEN} bytes"),
            });
        }
        control.config.destination_path = Some(path.to_owned());
        tracing::debug!(path, "destination path configured");
        Ok(())
    }

    /// Set the loss policy. Idle only.
    ///
    /// `keep_backlog = true` preserves unflushed backlog across writes and
    /// drops only overflow; `false` lets each write supersede the backlog,
    /// bounding worst-case latency at the cost of completeness.
    pub async fn set_loss_policy(&self, keep_backlog: bool) -> Result<()> {
        let mut control = self.idle_control("cannot configure loss policy").await?;
        control.config.keep_backlog = keep_backlog;
        self.keep_backlog.store(keep_backlog, Ordering::Relaxed);
        tracing::debug!(keep_backlog, "loss policy configured");
        Ok(())
    }

    /// Apply a whole configuration snapshot. Idle only.
    pub async fn apply_config(&self, config: &DeviceConfig) -> Result<()> {
        if let Some(line) = config.interrupt_line {
            self.set_interrupt_line(line).await?;
        }
        self.set_delay(config.delay).await?;
        self.set_chunk_size(config.chunk_size).await?;
        if let Some(path) = &config.destination_path {
            self.set_destination_path(path).await?;
        }
        self.set_loss_policy(config.keep_backlog).await?;
        Ok(())
    }

    /// Transition Idle -> Running
    ///
    /// Requires the interrupt line and destination path to have been set.
    /// Opens the sink, registers the interrupt line, then resets the
    /// buffer and outstanding counter and spawns the drain worker. Fails
    /// without side effects (back to Idle, sink closed, buffered data
    /// untouched) if any step is refused.
    pub async fn start(&self) -> Result<()> {
        let mut control = self.control.lock().await;
        if control.running() {
            return Err(DeviceError::Busy("device is already running"));
        }

        let line = control
            .config
            .interrupt_line
            .ok_or(DeviceError::InvalidArgument {
                field: "interrupt_line",
                message: "must be configured before start".into(),
            })?;
        let path = control
            .config
            .destination_path
            .clone()
            .ok_or(DeviceError::InvalidArgument {
                field: "destination_path",
                message: "must be configured before start".into(),
            })?;

        let mut sink = self
            .opener
            .open(&path)
            .await
            .map_err(|source| DeviceError::SinkUnavailable {
                path: path.clone(),
                source,
            })?;

        let (drain_tx, drain_rx) = mpsc::unbounded_channel();
        let handle = InterruptHandle::new(
            Arc::clone(&self.logs),
            drain_tx.clone(),
            Arc::clone(&self.counters),
        );

        // Register before touching the transfer state: a refused
        // registration must leave pre-buffered data intact.
        let irq_guard = match self.interrupts.register(line, handle) {
            Ok(guard) => guard,
            Err(error) => {
                if let Err(close_error) = sink.close().await {
                    tracing::warn!(%close_error, "sink close failed after aborted start");
                }
                return Err(error);
            }
        };

        {
            let mut transfer = self.transfer.lock().await;
            transfer.buffer.clear();
            transfer.sink = Some(sink);
            transfer.outstanding.store(0, Ordering::Relaxed);
        }

        let worker = DrainWorker {
            rx: drain_rx,
            transfer: Arc::clone(&self.transfer),
            logs: Arc::clone(&self.logs),
            counters: Arc::clone(&self.counters),
            delay: control.config.delay,
            chunk_size: control.config.chunk_size,
        };
        let worker = tokio::spawn(worker.run());

        control.runtime = Some(Runtime {
            irq_guard,
            drain_tx,
            worker,
        });
        tracing::info!(line, %path, "device started");
        Ok(())
    }

    /// Transition Running -> Idle
    ///
    /// Unregisters the interrupt first (no new jobs), then joins the drain
    /// worker so every already-queued drain completes - a blocking join
    /// with no timeout. Remaining buffered data is then flushed to the
    /// sink when the loss policy preserves backlog, discarded otherwise,
    /// and the sink is closed.
    pub async fn stop(&self) -> Result<()> {
        let mut control = self.control.lock().await;
        let Some(runtime) = control.runtime.take() else {
            return Err(DeviceError::Busy("device is not running"));
        };

        let Runtime {
            irq_guard,
            drain_tx,
            worker,
        } = runtime;
        drop(irq_guard);
        drop(drain_tx);
        if let Err(error) = worker.await {
            tracing::warn!(%error, "drain worker did not shut down cleanly");
        }

        let mut transfer = self.transfer.lock().await;
        let remaining = transfer.buffer.len();
        if remaining > 0 {
            if control.config.keep_backlog {
                let out = transfer.write_to_sink(remaining).await;
                transfer.outstanding.fetch_sub(out, Ordering::Relaxed);
                self.counters.record_flush(out as u64);
                if out < remaining {
                    self.counters.record_dropped((remaining - out) as u64);
                    tracing::warn!(
                        lost = remaining - out,
                        "final flush fell short, remaining backlog discarded"
                    );
                    transfer.buffer.clear();
                    transfer.outstanding.store(0, Ordering::Relaxed);
                }
            } else {
                transfer.buffer.clear();
                transfer.outstanding.store(0, Ordering::Relaxed);
                self.counters.record_dropped(remaining as u64);
                tracing::debug!(discarded = remaining, "backlog discarded on stop");
            }
        }

        if let Some(mut sink) = transfer.sink.take() {
            if let Err(error) = sink.sync().await {
                tracing::warn!(%error, "sink sync failed on stop");
            }
            if let Err(error) = sink.close().await {
                tracing::warn!(%error, "sink close failed on stop");
            }
        }
        tracing::info!("device stopped");
        Ok(())
    }

    /// Accept data from the producer, returning the bytes admitted
    ///
    /// Allowed in any state. With `keep_backlog = false` the write first
    /// supersedes any unflushed backlog; overflow beyond the buffer
    /// capacity is dropped and reported as a warning carrying the count.
    /// Partial admission is the reported outcome, never an error.
    pub async fn write(&self, data: &[u8]) -> usize {
        let mut transfer = self.transfer.lock().await;

        if !self.keep_backlog.load(Ordering::Relaxed) && !transfer.buffer.is_empty() {
            let superseded = transfer.buffer.len();
            transfer.buffer.clear();
            transfer.outstanding.store(0, Ordering::Relaxed);
            self.counters.record_dropped(superseded as u64);
            tracing::debug!(superseded, "unflushed backlog superseded by new write");
        }

        let admitted = transfer.buffer.push(data);
        transfer.outstanding.fetch_add(admitted, Ordering::Relaxed);
        if admitted < data.len() {
            let dropped = data.len() - admitted;
            self.counters.record_dropped(dropped as u64);
            tracing::warn!(dropped, "buffer full, overflow dropped");
        }
        admitted
    }

    /// Destructively read one log ring as formatted text
    ///
    /// Returns all currently queued records as lines, up to `max_len`
    /// bytes, and removes them from the ring. An empty ring yields an
    /// empty string, not an error.
    pub fn read_log(&self, kind: LogKind, max_len: usize) -> String {
        let mut out = String::new();
        self.logs.ring(kind).drain_to_text(&mut out, max_len);
        out
    }

    /// Direct access to the log rings
    pub fn logs(&self) -> &LogSet {
        &self.logs
    }

    /// Bytes buffered but not yet drained (lock-free read)
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Whether the device is Running
    pub async fn running(&self) -> bool {
        self.control.lock().await.running()
    }

    /// Snapshot of the device counters
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            interrupts: self.counters.interrupts.load(Ordering::Relaxed),
            missed_interrupts: self.counters.missed_interrupts.load(Ordering::Relaxed),
            drains: self.counters.drains.load(Ordering::Relaxed),
            bytes_drained: self.counters.bytes_drained.load(Ordering::Relaxed),
            bytes_dropped: self.counters.bytes_dropped.load(Ordering::Relaxed),
            outstanding: self.outstanding(),
        }
    }

    /// Take the open lock, rejecting with `Busy` when Running
    async fn idle_control(
        &self,
        what: &'static str,
    ) -> Result<tokio::sync::MutexGuard<'_, Control>> {
        let control = self.control.lock().await;
        if control.running() {
            return Err(DeviceError::Busy(what));
        }
        Ok(control)
    }
}
