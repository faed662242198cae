//! Log wiring: env-filtered tracing to stdout, pretty or JSON

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects the output format (`pretty` or `json`)
pub const LOG_FORMAT_ENV: &str = "UPTIME_LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "uptime=info,heat_uptime=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development: human-readable, colored
    Pretty,
    /// Production: one JSON object per line
    Json,
}

impl LogFormat {
    /// Anything other than `json` falls back to pretty output
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init() -> Result<WorkerGuard> {
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("invalid log filter")?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init(),
    }
    .context("failed to install log subscriber")?;

    Ok(guard)
}
