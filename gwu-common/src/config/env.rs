//! Environment variable parsing with type safety.
//!
//! GitHub passes action inputs as `INPUT_<NAME>` variables (name upper-cased,
//! hyphens kept) and runner context as `GITHUB_*` variables. [`EnvParser`]
//! reads both with validation, error collection, and source tracking.

use super::source::Sourced;
use std::env;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Required variable is not set or empty.
    #[error("Missing required variable {var}")]
    Missing { var: String },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Parser for action inputs (`INPUT_` prefix).
    pub fn inputs() -> Self {
        Self::with_prefix("INPUT_")
    }

    pub fn with_prefix(prefix: &'static str) -> Self {
        Self {
            prefix,
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Get a string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if !value.trim().is_empty() => Sourced::from_env(value.trim().to_string(), var_name),
            _ => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a non-empty string, recording an error when it is absent.
    pub fn get_required(&mut self, name: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if !value.trim().is_empty() => Sourced::from_env(value.trim().to_string(), var_name),
            _ => {
                self.errors.push(EnvError::Missing { var: var_name });
                Sourced::default_value(String::new())
            }
        }
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off (for false)
    /// An empty value means "not provided" and yields the default, since
    /// GitHub sets unset inputs to the empty string.
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if value.trim().is_empty() => Sourced::default_value(default),
            Ok(value) => {
                let parsed = match value.trim().to_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" => false,
                    _ => {
                        self.errors.push(EnvError::InvalidValue {
                            var: var_name.clone(),
                            expected: "boolean (true/false/1/0/yes/no)".to_string(),
                            value: value.clone(),
                        });
                        default
                    }
                };
                Sourced::from_env(parsed, var_name)
            }
            Err(_) => Sourced::default_value(default),
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => {
                let lower = value.to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        Sourced::from_env(lower, var_name)
                    }
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var_name.clone(),
                            value: value.clone(),
                        });
                        Sourced::from_env(default.to_string(), var_name)
                    }
                }
            }
            Err(_) => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a comma-separated list of strings.
    pub fn get_string_list(&mut self, name: &str) -> Sourced<Vec<String>> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => {
                let items: Vec<String> = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                Sourced::from_env(items, var_name)
            }
            Err(_) => Sourced::default_value(Vec::new()),
        }
    }

    /// Get an optional string (None if not set or empty).
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if value.trim().is_empty() => Sourced::from_env(None, var_name),
            Ok(value) => Sourced::from_env(Some(value.trim().to_string()), var_name),
            Err(_) => Sourced::default_value(None),
        }
    }
}
