//! FileSink tests

use gih_core::{Sink, SinkOpener};

use crate::FileSinkOpener;

#[tokio::test]
async fn test_write_sync_close_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drain.out");
    let path = path.to_str().unwrap();

    let opener = FileSinkOpener;
    let mut sink = opener.open(path).await.unwrap();
    assert_eq!(sink.write(b"HELL").await.unwrap(), 4);
    sink.sync().await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(std::fs::read(path).unwrap(), b"HELL");
}

#[tokio::test]
async fn test_reopen_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drain.out");
    let path = path.to_str().unwrap();

    let opener = FileSinkOpener;
    let mut sink = opener.open(path).await.unwrap();
    sink.write(b"first").await.unwrap();
    sink.close().await.unwrap();

    let mut sink = opener.open(path).await.unwrap();
    sink.write(b" second").await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(std::fs::read(path).unwrap(), b"first second");
}

#[tokio::test]
async fn test_open_missing_directory_fails() {
    let opener = FileSinkOpener;
    let result = opener.open("/no/such/directory/drain.out").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_memory_sink_accept_limit() {
    use crate::MemorySink;

    let mut sink = MemorySink::with_accept_limit(3);
    assert_eq!(sink.write(b"HELLO").await.unwrap(), 3);
    assert_eq!(sink.contents(), b"HEL");

    sink.close().await.unwrap();
    assert!(sink.write(b"X").await.is_err());
}
