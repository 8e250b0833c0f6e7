//! File sink - append-only destination file
//!
//! The hosted analog of the reference device's in-kernel file I/O: open by
//! path, write, fsync, close. The file is created if missing and always
//! appended, so restarting the device keeps accumulating into the same
//! destination.

use std::io;

use async_trait::async_trait;
use gih_core::{Sink, SinkOpener};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Destination file for drained bytes
pub struct FileSink {
    file: File,
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data).await
    }

    async fn sync(&mut self) -> io::Result<()> {
        self.file.sync_data().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.file.shutdown().await
    }
}

/// Opens [`FileSink`]s in create-or-append mode
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSinkOpener;

#[async_trait]
impl SinkOpener for FileSinkOpener {
    async fn open(&self, path: &str) -> io::Result<Box<dyn Sink>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        tracing::debug!(path, "destination file opened");
        Ok(Box::new(FileSink { file }))
    }
}
