//! Smoke tests for the gihd stack
//!
//! Exercise the full path the daemon wires together - TOML config, the
//! core device, and the file sink - without the process-global pieces
//! (stdin, real signals).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use gih_config::Config;
use gih_core::{Device, LogKind, ManualInterrupts};
use gih_sinks::FileSinkOpener;

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 2s");
}

#[tokio::test]
async fn test_config_to_file_sink_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("drain.out");

    let config = Config::from_str(&format!(
        r#"
[device]
interrupt_line = 10
chunk_size = 4
path = "{}"
keep_backlog = true
buffer_capacity = 64
"#,
        dest.display()
    ))
    .unwrap();
    config.validate().unwrap();

    let interrupts = ManualInterrupts::new();
    let device = Device::with_buffer_capacity(
        Arc::new(FileSinkOpener),
        interrupts.clone(),
        config.device.buffer_capacity,
    );
    device
        .apply_config(&config.device.to_device_config())
        .await
        .unwrap();
    device.start().await.unwrap();

    assert_eq!(device.write(b"HELLOWORLD").await, 10);
    assert!(interrupts.fire());
    wait_until(|| device.outstanding() == 6).await;
    assert_eq!(std::fs::read(&dest).unwrap(), b"HELL");

    // stop flushes the rest under the keep policy
    device.stop().await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"HELLOWORLD");

    let end_log = device.read_log(LogKind::DrainEnd, 1 << 20);
    assert!(end_log.contains("bytes=4"));

    let stats = device.stats();
    assert_eq!(stats.interrupts, 1);
    assert_eq!(stats.bytes_drained, 10);
    assert_eq!(stats.bytes_dropped, 0);
}

#[tokio::test]
async fn test_unwritable_destination_fails_start() {
    let config = Config::from_str(
        r#"
[device]
interrupt_line = 10
path = "/no/such/directory/drain.out"
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let interrupts = ManualInterrupts::new();
    let device = Device::new(Arc::new(FileSinkOpener), interrupts);
    device
        .apply_config(&config.device.to_device_config())
        .await
        .unwrap();

    assert!(matches!(
        device.start().await,
        Err(gih_core::DeviceError::SinkUnavailable { .. })
    ));
    assert!(!device.running().await);
}
