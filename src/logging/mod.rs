// Structured logging setup using the tracing crate

use crate::config::{LogFormat, LoggingConfig};
use crate::error::WatermarkError;
use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` when set, otherwise `config.level`.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, WatermarkError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            WatermarkError::Config(format!("invalid log level '{}': {}", config.level, e))
        }),
    }
}

/// Initialize the global tracing subscriber.
///
/// Events go to stderr so stdout stays free for the CLI's output path.
///
/// # Errors
///
/// Returns [`WatermarkError::Config`] for an unparseable level and when a
/// global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use inkstamp::config::LoggingConfig;
/// use inkstamp::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), WatermarkError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    result.map_err(|e| WatermarkError::Config(format!("failed to install subscriber: {}", e)))
}
