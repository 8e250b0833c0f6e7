//! GIH - generic interrupt-handled drain engine
//!
//! A single device accepts a stream of bytes from a producer, holds it in a
//! bounded FIFO buffer, and forwards it to a destination sink in fixed-size
//! chunks, each transfer triggered by an external interrupt and delayed by a
//! configurable amount. Every interrupt and every drain is recorded in one of
//! three bounded log rings for later inspection.
//!
//! # Architecture
//!
//! ```text
//! [Producer]                [Interrupt]                 [Sink]
//!    write() ──→ ByteRing      fire() ──→ drain queue ──→ DrainWorker ──→ file
//!                   ▲             │                          │
//!                   └── write lock┆ (non-blocking)           └── write lock
//!                                 └──→ interrupt LogRing
//! ```
//!
//! # Concurrency contexts
//!
//! - **Interrupt**: [`InterruptHandle::fire`] is synchronous and never
//!   blocks. It appends one log record and queues one drain job.
//! - **Deferred work**: a single drain-worker task consumes the job queue
//!   strictly in order, one job at a time, sleeping the configured delay and
//!   holding the write lock for the active duration of each drain.
//! - **User/control**: configuration and lifecycle calls are serialized on
//!   the open lock; `write()` is serialized on the write lock and is allowed
//!   in any state.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gih_core::{Device, ManualInterrupts};
//! use gih_sinks::FileSinkOpener;
//!
//! let interrupts = ManualInterrupts::new();
//! let device = Device::new(Arc::new(FileSinkOpener::default()), interrupts.clone());
//!
//! device.set_interrupt_line(1).await?;
//! device.set_destination_path("/tmp/drain.out").await?;
//! device.set_chunk_size(4).await?;
//! device.start().await?;
//!
//! device.write(b"HELLOWORLD").await;
//! interrupts.fire();          // 4 bytes reach the sink after the delay
//!
//! device.stop().await?;
//! ```

mod buffer;
mod device;
mod error;
mod interrupt;
mod log;
mod sink;
mod worker;

#[cfg(test)]
mod buffer_test;
#[cfg(test)]
mod log_test;

pub use buffer::ByteRing;
pub use device::{Device, DeviceConfig, DeviceStats};
pub use error::{DeviceError, Result};
pub use interrupt::{InterruptController, InterruptGuard, InterruptHandle, ManualInterrupts};
pub use log::{LogKind, LogRecord, LogRing, LogSet};
pub use sink::{Sink, SinkOpener};

/// Default data buffer capacity (1 MiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1 << 20;

/// Records held by each log ring before appends are rejected.
pub const LOG_RING_CAPACITY: usize = 8192;

/// Maximum accepted destination path length in bytes.
pub const MAX_PATH_LEN: usize = 128;
