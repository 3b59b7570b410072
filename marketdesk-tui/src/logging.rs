//! Log file setup. The terminal belongs to the UI, so everything goes to
//! `log_path` as JSON lines.

use crate::config::ConsoleConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "marketdesk_tui=info,marketdesk_client=info,marketdesk_core=info,warn";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid log filter: {0}")]
    Filter(String),
    #[error("Failed to init subscriber: {0}")]
    Init(String),
}

/// Filter from `RUST_LOG`, else the configured directive, else the default.
pub fn build_filter(configured: Option<&str>) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER))
        .map_err(|err| LoggingError::Filter(err.to_string()))
}

pub fn init(config: &ConsoleConfig) -> Result<(), LoggingError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let filter = build_filter(config.log_filter.as_deref())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))?;

    tracing::info!(log_path = %config.log_path.display(), "logging initialized");
    Ok(())
}
