//! Error types for the wrapper update engine.
//!
//! Every failure the engine can raise carries a stable code in the
//! `GWU-Exxx` format so CI logs can be grepped and linked.
//!
//! | Range      | Category | Description                             |
//! |------------|----------|-----------------------------------------|
//! | E001-E099  | Config   | Wrapper properties and URL parsing      |
//! | E100-E199  | Network  | Release metadata and checksum fetching  |
//! | E200-E299  | Wrapper  | Rewriting and running the wrapper       |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::distribution::DistType;

/// Error code enumeration covering every engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Wrapper properties are missing `distributionUrl` or it is malformed
    MalformedConfig,
    /// No version could be extracted from a distribution URL
    UnparsableVersion,
    /// Release metadata could not be fetched or decoded
    FetchError,
    /// Pinning requested but the release carries no checksum for the kind
    MissingChecksum,
    /// Backing properties file could not be written
    WriteFailure,
    /// Wrapper reported a different version than the one pinned
    VersionMismatch,
    /// Wrapper executable could not be run
    ExecutionFailure,
}

impl ErrorCode {
    /// Numeric part of the code.
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::MalformedConfig => 1,
            Self::UnparsableVersion => 2,
            Self::FetchError => 100,
            Self::MissingChecksum => 101,
            Self::WriteFailure => 200,
            Self::VersionMismatch => 201,
            Self::ExecutionFailure => 202,
        }
    }

    /// Formatted code, e.g. `GWU-E201`.
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("GWU-E{:03}", self.code_number())
    }

    /// One-line remediation hint shown next to the error.
    #[must_use]
    pub const fn remediation(&self) -> &'static str {
        match self {
            Self::MalformedConfig => {
                "Check that distributionUrl points at .../distributions/gradle-<version>-<bin|all>.zip"
            }
            Self::UnparsableVersion => "Use a distribution file named gradle-<version>-<bin|all>.zip",
            Self::FetchError => "Check connectivity to services.gradle.org and re-run the job",
            Self::MissingChecksum => {
                "Disable checksum pinning or re-run once the release checksums are published"
            }
            Self::WriteFailure => "Check file permissions and free disk space in the checkout",
            Self::VersionMismatch => {
                "Inspect the wrapper output; the distribution may be missing or its checksum wrong"
            }
            Self::ExecutionFailure => {
                "Make sure gradlew is executable and a Java runtime is available on the runner"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

/// Errors raised by parsing, updating, and verifying a wrapper.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Malformed wrapper configuration {}: {reason}", path.display())]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("Unable to extract a Gradle version from '{url}'")]
    UnparsableVersion { url: String },

    #[error("Unable to fetch release data: {0}")]
    FetchError(String),

    #[error("Release {version} has no published checksum for the '{dist_type}' distribution")]
    MissingChecksum { version: String, dist_type: DistType },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Wrapper update failed: expected Gradle {expected}, wrapper reported {}",
        reported.as_deref().unwrap_or("no version")
    )]
    VersionMismatch {
        expected: String,
        reported: Option<String>,
    },

    #[error("Failed to run wrapper in {}: {reason}", project_dir.display())]
    ExecutionFailure { project_dir: PathBuf, reason: String },
}

impl UpdateError {
    /// Catalog code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedConfig { .. } => ErrorCode::MalformedConfig,
            Self::UnparsableVersion { .. } => ErrorCode::UnparsableVersion,
            Self::FetchError(_) => ErrorCode::FetchError,
            Self::MissingChecksum { .. } => ErrorCode::MissingChecksum,
            Self::WriteFailure { .. } => ErrorCode::WriteFailure,
            Self::VersionMismatch { .. } => ErrorCode::VersionMismatch,
            Self::ExecutionFailure { .. } => ErrorCode::ExecutionFailure,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
