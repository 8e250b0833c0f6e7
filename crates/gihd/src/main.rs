//! gihd - hosted daemon for the GIH drain engine
//!
//! Loads a TOML config, starts one device wired to a destination file and
//! a Unix-signal interrupt line, and feeds stdin into the device's write
//! path. Each delivered signal forwards one chunk to the destination after
//! the configured delay.
//!
//! # Usage
//!
//! ```bash
//! gihd --config configs/gihd.toml &
//! echo -n HELLOWORLD > /proc/$!/fd/0   # or pipe a producer into gihd
//! kill -USR1 $!                        # trigger one drain
//! ```
//!
//! Ctrl-C (or SIGINT) stops the device: the interrupt line is released,
//! in-flight drains finish, the backlog is flushed or discarded per the
//! loss policy, and the three log rings are dumped to `log_dump_dir`.

mod signals;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gih_config::{Config, LogConfig, LogFormat};
use gih_core::{Device, LogKind};
use gih_sinks::FileSinkOpener;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::signals::SignalInterrupts;

/// gihd - interrupt-triggered byte forwarder
#[derive(Parser, Debug)]
#[command(name = "gihd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/gihd.toml")]
    config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    init_logging(&config.log, cli.log_level.as_deref())?;
    run(config).await
}

/// Initialize the tracing subscriber for daemon logging
fn init_logging(log: &LogConfig, override_level: Option<&str>) -> Result<()> {
    let level = override_level.unwrap_or_else(|| log.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let device = Arc::new(Device::with_buffer_capacity(
        Arc::new(FileSinkOpener),
        Arc::new(SignalInterrupts),
        config.device.buffer_capacity,
    ));

    device.apply_config(&config.device.to_device_config()).await?;
    device.start().await?;
    info!(
        line = config.device.interrupt_line,
        path = config.device.path.as_deref(),
        "device running; signal the process to trigger drains"
    );

    let producer = tokio::spawn(feed_stdin(Arc::clone(&device)));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutting down");

    producer.abort();
    device.stop().await?;

    if let Some(dir) = &config.device.log_dump_dir {
        dump_log_rings(&device, dir, config.device.log_read_max)?;
    }

    let stats = device.stats();
    info!(
        interrupts = stats.interrupts,
        missed = stats.missed_interrupts,
        drains = stats.drains,
        bytes_drained = stats.bytes_drained,
        bytes_dropped = stats.bytes_dropped,
        "final device stats"
    );
    Ok(())
}

/// Feed stdin into the device's write path until EOF
async fn feed_stdin(device: Arc<Device>) {
    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 4096];
    loop {
        match stdin.read(&mut buf).await {
            Ok(0) => {
                debug!("stdin closed, producer done");
                break;
            }
            Ok(n) => {
                let admitted = device.write(&buf[..n]).await;
                debug!(read = n, admitted, "buffered producer data");
            }
            Err(error) => {
                warn!(%error, "stdin read failed, producer done");
                break;
            }
        }
    }
}

/// Drain the three log rings into per-ring text files
fn dump_log_rings(device: &Device, dir: &Path, max_len: usize) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log dump dir {}", dir.display()))?;
    for (kind, file) in [
        (LogKind::Interrupt, "interrupt.log"),
        (LogKind::DrainStart, "drain-start.log"),
        (LogKind::DrainEnd, "drain-end.log"),
    ] {
        let text = device.read_log(kind, max_len);
        std::fs::write(dir.join(file), text)
            .with_context(|| format!("writing {} to {}", file, dir.display()))?;
    }
    info!(dir = %dir.display(), "log rings dumped");
    Ok(())
}
