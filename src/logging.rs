use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Route `tracing` output to a daily rolling file under the data directory.
/// The terminal belongs to the TUI, so nothing is written to stdout. Keep the
/// returned guard alive for the whole run or buffered lines are lost.
pub fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir).context("failed to create log directory")?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, "aviary.log"));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let env_filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(guard)
}
