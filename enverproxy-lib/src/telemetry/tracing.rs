//! Logging setup, grounded on the teacher's `telemetry::tracing::init_tracing_with_otel`
//! but dispatching on spec.md §6's `verbosity`/`log_type` keys instead of an
//! OpenTelemetry log level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::config::{Config, LogType};

/// Map spec.md §6's 0-3 verbosity scale onto a `tracing` level filter.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

/// Initialize the global tracing subscriber from `config`.
///
/// `LogType::Syslog` and `LogType::Remote` both render through the same
/// stdout-backed `fmt` layer as `LogType::Stdout` (see `config::root::LogType`
/// for why); only the effective level changes.
pub fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter_str = level_for(config.verbosity);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_str));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to set global tracing subscriber: {e}"))?;

    if !matches!(config.log_type, LogType::Stdout) {
        tracing::warn!(
            log_type = ?config.log_type,
            "syslog/remote log_type configured; logging through stdout"
        );
    }

    Ok(())
}

/// Flush stdout/stderr before process exit.
pub fn shutdown_tracing() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}
