//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level.

mod config;

pub(crate) use config::{LogFormat, LoggerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. Later calls are no-ops.
pub(crate) fn initialize(logger_config: &LoggerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logger_config.level));

    let result = match logger_config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer().json();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    if let Err(error) = result {
        tracing::debug!(%error, "Global subscriber already installed");
    }
}
