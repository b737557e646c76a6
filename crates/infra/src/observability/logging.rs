//! Subscriber setup for structured logs.

use std::sync::OnceLock;

use syncward_domain::{LogFormat, LoggingConfig, Result, SyncwardError};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Initialize tracing for the process.
///
/// `RUST_LOG` takes precedence over `config.level`. JSON output is one line
/// per event with event fields flattened to the top level next to
/// `timestamp` and `level`.
///
/// Only the first call installs a subscriber; later calls return the first
/// call's result.
///
/// # Errors
/// Returns `SyncwardError::Config` for an invalid filter directive and
/// `SyncwardError::Internal` if another subscriber was installed first.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;
    INIT.get_or_init(|| install(filter, config.format)).clone().map_err(SyncwardError::Internal)
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| SyncwardError::Config(format!("invalid log filter '{level}': {e}")))
}

/// JSON subscriber with the record shape [`init_logging`] installs, writing
/// to `writer`.
///
/// Each event is one line: `timestamp`, `level`, the flattened event fields
/// (`message`, `event`, `error_kind`, ...) and the current span.
pub fn json_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .with_writer(writer)
        .finish()
}

fn install(filter: EnvFilter, format: LogFormat) -> std::result::Result<(), String> {
    let result = match format {
        LogFormat::Json => json_subscriber(filter, std::io::stdout).try_init().map_err(|e| e.to_string()),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init()
            .map_err(|e| e.to_string()),
    };
    result.map_err(|e| format!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("syncward=loud").expect_err("directive should not parse");
        assert!(matches!(err, SyncwardError::Config(_)));
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = LoggingConfig::default();
        init_logging(&config).expect("first init");
        init_logging(&LoggingConfig { format: LogFormat::Pretty, ..config })
            .expect("second init returns the first result");
        tracing::info!(event = "logging_ready", "subscriber installed");
    }
}
