//! Source tracking for configuration values.

use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// Environment variable.
    Environment,
    /// Command-line flag.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Environment => write!(f, "environment"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A value together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Variable name when the value came from the environment.
    pub env_var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            env_var: None,
        }
    }

    pub fn from_env(value: T, var: String) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            env_var: Some(var),
        }
    }

    pub fn from_cli(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::CommandLine,
            env_var: None,
        }
    }

    /// Human-readable origin, e.g. `environment (INPUT_LABELS)`.
    pub fn describe_source(&self) -> String {
        match &self.env_var {
            Some(var) => format!("{} ({var})", self.source),
            None => self.source.to_string(),
        }
    }
}
