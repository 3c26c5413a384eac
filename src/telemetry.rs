//! Tracing subscriber setup.
//!
//! Logs go to stderr so the console runner keeps stdout for prompts.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("tracing already initialised: {0}")]
    Init(#[from] TryInitError),
}

/// `RUST_LOG` when set and valid, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level),
    }
}

/// Installs the global subscriber.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
