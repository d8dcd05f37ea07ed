//! Logging setup shared by the binary and tests.
//!
//! Logs always go to stderr so stdout stays free for the pull request URL.
//! The level comes from `GWU_LOG_LEVEL` and is raised to `debug` when GitHub
//! runs the step with debug logging (`RUNNER_DEBUG=1`). `RUST_LOG`, when set,
//! overrides the computed filter entirely.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::EnvParser;

/// Crates whose events pass the filter at the configured level.
const OWN_TARGETS: [&str; 2] = ["gwu", "gwu_common"];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, single line per event.
    #[default]
    Compact,
    /// Multi-line with span context.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (compact, pretty, json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => f.write_str("compact"),
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// Read `GWU_LOG_LEVEL` / `GWU_LOG_FORMAT` and `RUNNER_DEBUG`.
    ///
    /// Invalid values fall back to the defaults.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::with_prefix("GWU_");
        let mut level = parser.get_log_level("LOG_LEVEL", default_level).value;
        let format = parser
            .get_string("LOG_FORMAT", "compact")
            .value
            .parse()
            .unwrap_or_default();

        if EnvParser::with_prefix("RUNNER_").get_bool("DEBUG", false).value {
            level = "debug".to_string();
        }

        Self { level, format }
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter directive: own crates at `level`, dependencies at `warn`.
    pub fn directive(&self) -> String {
        let mut parts = vec!["warn".to_string()];
        parts.extend(OWN_TARGETS.iter().map(|target| format!("{target}={}", self.level)));
        parts.join(",")
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return Ok(EnvFilter::from_default_env());
        }
        let directive = self.directive();
        EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
            filter: directive,
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().with_span_events(FmtSpan::NONE).try_init(),
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
    };
    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
