//! Sink trait - the destination for drained bytes
//!
//! The drain path consumes the destination through exactly four operations:
//! open (via [`SinkOpener`]), write, sync, close. Implementations live
//! outside this crate; `gih-sinks` provides the file sink the daemon uses
//! and an in-memory sink for tests.

use std::io;

use async_trait::async_trait;

/// Destination for drained bytes
///
/// Held by the device while Running and accessed only under the write
/// lock, so implementations need `Send` but not `Sync`.
#[async_trait]
pub trait Sink: Send {
    /// Write `data`, returning the number of bytes the sink accepted
    ///
    /// A short count is not an error at this level; the drain worker
    /// leaves unaccepted bytes buffered and reports the shortfall.
    async fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush accepted bytes toward stable storage, best effort
    async fn sync(&mut self) -> io::Result<()>;

    /// Close the sink; it is not used again afterwards
    async fn close(&mut self) -> io::Result<()>;
}

/// Opens sinks by destination path on device start
#[async_trait]
pub trait SinkOpener: Send + Sync {
    /// Open the destination at `path` for writing
    async fn open(&self, path: &str) -> io::Result<Box<dyn Sink>>;
}
