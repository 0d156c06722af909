//! Tracing subscriber setup.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Errors
///
/// Returns `TryInitError` if a global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_ascii_lowercase()))
    };

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    }
}

/// Emit the startup warnings that could not be logged before the subscriber
/// existed.
pub fn report_config(config: &LogConfig) {
    if let Some(raw) = &config.unrecognized_level {
        tracing::warn!(value = %raw, "Unrecognized LOG_LEVEL, falling back to info");
    }
}
