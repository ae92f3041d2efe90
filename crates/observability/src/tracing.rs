//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Selects the output format (`json` or `compact`).
pub const FORMAT_VAR: &str = "CONSOLE_LOG_FORMAT";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Single-line human-readable output for local runs.
    Compact,
}

impl LogFormat {
    /// Unknown or missing values fall back to JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("compact") | Some("text") => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing from the environment: `RUST_LOG` for verbosity and
/// `CONSOLE_LOG_FORMAT` for the format.
///
/// Stale response discards are logged at `debug` under the `console_query`
/// target, so `RUST_LOG=console_query=debug` surfaces them.
pub fn init() {
    let format = LogFormat::parse(std::env::var(FORMAT_VAR).ok().as_deref());
    init_with(format, DEFAULT_FILTER);
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_with(format: LogFormat, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}
