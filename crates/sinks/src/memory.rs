//! In-memory capture sink
//!
//! Records every accepted byte in a shared buffer so callers can inspect
//! exactly what a drain delivered. Supports injecting short writes to
//! exercise the engine's data-loss reporting.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gih_core::{Sink, SinkOpener};
use parking_lot::Mutex;

#[derive(Default)]
struct Shared {
    data: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

/// Sink that appends accepted bytes to a shared in-memory buffer
#[derive(Clone, Default)]
pub struct MemorySink {
    shared: Arc<Shared>,
    /// Accept at most this many bytes per write call
    accept_limit: Option<usize>,
}

impl MemorySink {
    /// Create an unlimited capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that accepts at most `limit` bytes per write
    pub fn with_accept_limit(limit: usize) -> Self {
        Self {
            shared: Arc::default(),
            accept_limit: Some(limit),
        }
    }

    /// Everything accepted so far
    pub fn contents(&self) -> Vec<u8> {
        self.shared.data.lock().clone()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        let n = self.accept_limit.map_or(data.len(), |l| l.min(data.len()));
        self.shared.data.lock().extend_from_slice(&data[..n]);
        Ok(n)
    }

    async fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Opener handing out clones of one [`MemorySink`]
///
/// Every `open` returns a fresh handle to the same capture buffer, so a
/// stopped-and-restarted device keeps appending to it.
#[derive(Clone, Default)]
pub struct MemorySinkOpener {
    sink: MemorySink,
}

impl MemorySinkOpener {
    /// Create an opener around a fresh capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink handle backing this opener, for inspection
    pub fn sink(&self) -> &MemorySink {
        &self.sink
    }
}

#[async_trait]
impl SinkOpener for MemorySinkOpener {
    async fn open(&self, _path: &str) -> io::Result<Box<dyn Sink>> {
        let mut sink = self.sink.clone();
        sink.shared.closed.store(false, Ordering::SeqCst);
        Ok(Box::new(sink))
    }
}
