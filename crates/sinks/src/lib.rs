//! Sink implementations for the GIH drain engine
//!
//! - [`FileSink`] / [`FileSinkOpener`]: the destination the daemon uses, a
//!   regular file written append-only and synced after each drain.
//! - [`MemorySink`] / [`MemorySinkOpener`]: an in-memory capture sink for
//!   tests and smoke runs.

mod file;
mod memory;

pub use file::{FileSink, FileSinkOpener};
pub use memory::{MemorySink, MemorySinkOpener};

#[cfg(test)]
mod file_test;
