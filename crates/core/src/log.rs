//! Bounded log rings
//!
//! Three independent rings accumulate fixed-size records: one per caught
//! interrupt, one per drain-worker entry, one per drain-worker exit.
//! Appending never blocks and never overwrites - a full ring rejects the
//! record and counts the loss. Reading is destructive: records are formatted
//! to text oldest-first and permanently removed.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

use crate::LOG_RING_CAPACITY;

/// Which of the three rings to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// One record per caught interrupt
    Interrupt,
    /// One record per drain-worker invocation, stamped at entry
    DrainStart,
    /// One record per drain-worker invocation, carrying the bytes sent
    DrainEnd,
}

/// A single immutable log record
///
/// Created by the interrupt handler or the drain worker, destroyed when the
/// ring is drained to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Monotonically increasing counter scoped to the owning ring
    pub sequence: u64,
    /// Bytes sent by the drain this record describes; -1 when not
    /// applicable (interrupt and drain-start records)
    pub bytes_sent: i64,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Render the record as one human-readable output line
    pub fn format_line(&self) -> String {
        format!(
            "[{}] sequence={} bytes={}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.sequence,
            self.bytes_sent,
        )
    }
}

struct RingInner {
    queue: VecDeque<LogRecord>,
    next_sequence: u64,
}

/// Bounded ring of log records with write-many/read-and-drain semantics
///
/// Safe to append from the interrupt context: the critical section is a
/// short non-blocking push under a `parking_lot` mutex, never shared with
/// the data buffer's lock.
pub struct LogRing {
    name: &'static str,
    capacity: usize,
    inner: Mutex<RingInner>,
    lost: AtomicU64,
}

impl LogRing {
    /// Create an empty ring holding at most `capacity` records
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            inner: Mutex::new(RingInner {
                queue: VecDeque::with_capacity(capacity),
                next_sequence: 0,
            }),
            lost: AtomicU64::new(0),
        }
    }

    /// Ring name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of records currently queued
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Whether the ring holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records rejected (ring full) or dropped (no room in the output
    /// buffer during a drain) so far
    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Append a record stamped with the current time
    ///
    /// Returns `false` when the ring is full; the record is rejected and
    /// the loss counter incremented.
    pub fn append(&self, bytes_sent: i64) -> bool {
        self.append_at(Utc::now(), bytes_sent)
    }

    /// Append a record with an explicit timestamp
    ///
    /// Used by the drain worker to stamp the drain-start record with the
    /// time the worker actually entered, not the time it logged.
    pub fn append_at(&self, timestamp: DateTime<Utc>, bytes_sent: i64) -> bool {
        let mut inner = self.inner.lock();
        if inner.queue.len() >= self.capacity {
            self.lost.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(ring = self.name, "log ring full, record rejected");
            return false;
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.queue.push_back(LogRecord {
            sequence,
            bytes_sent,
            timestamp,
        });
        true
    }

    /// Dequeue records oldest-first and append their formatted lines to
    /// `out`, stopping once all records are consumed or appending another
    /// line would push `out` past `max_len` appended bytes
    ///
    /// Returns the number of records emitted. Reading is destructive, and a
    /// record whose line does not fit in the remaining space is consumed
    /// and dropped rather than re-queued (counted against [`Self::lost`]).
    /// That drop-on-no-fit behavior is the device's current contract; size
    /// `max_len` generously to avoid it.
    pub fn drain_to_text(&self, out: &mut String, max_len: usize) -> usize {
        let mut inner = self.inner.lock();
        let mut emitted = 0;
        let mut appended = 0;
        while let Some(record) = inner.queue.pop_front() {
            let line = record.format_line();
            if appended + line.len() > max_len {
                self.lost.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    ring = self.name,
                    sequence = record.sequence,
                    "log record dropped: formatted line does not fit in the read buffer"
                );
                break;
            }
            appended += line.len();
            // write! to a String cannot fail
            let _ = write!(out, "{line}");
            emitted += 1;
        }
        emitted
    }
}

/// The device's three log rings
pub struct LogSet {
    /// Ring fed by the interrupt top half
    pub interrupt: LogRing,
    /// Ring fed at drain-worker entry
    pub drain_start: LogRing,
    /// Ring fed at drain-worker exit
    pub drain_end: LogRing,
}

impl LogSet {
    /// Create the three rings with the standard capacity
    pub fn new() -> Self {
        Self::with_capacity(LOG_RING_CAPACITY)
    }

    /// Create the three rings with an explicit per-ring capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            interrupt: LogRing::new("interrupt", capacity),
            drain_start: LogRing::new("drain-start", capacity),
            drain_end: LogRing::new("drain-end", capacity),
        }
    }

    /// Address a ring by kind
    pub fn ring(&self, kind: LogKind) -> &LogRing {
        match kind {
            LogKind::Interrupt => &self.interrupt,
            LogKind::DrainStart => &self.drain_start,
            LogKind::DrainEnd => &self.drain_end,
        }
    }
}

impl Default for LogSet {
    fn default() -> Self {
        Self::new()
    }
}
