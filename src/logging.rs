use anyhow::Context;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Install the global tracing subscriber.
///
/// Events go to stdout and, without colors, to the append-mode log file
/// described by `config`. Only the binary calls this.
pub fn init(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Cannot create log directory {}", config.log_dir.display()))?;

    let log_path = config.log_path();
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Cannot open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).context("Invalid log filter")?)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()
        .context("Tracing subscriber already initialized")?;

    Ok(())
}
