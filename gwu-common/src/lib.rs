//! Shared engine for Gradle Wrapper Updater.
//!
//! Parses `gradle-wrapper.properties`, rewrites it for a new Gradle release
//! without touching unrelated lines, and verifies the result by running the
//! project's wrapper.

#![deny(unsafe_code)]

pub mod config;
pub mod distribution;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod properties;
pub mod release;
pub mod verify;
pub mod wrapper;

pub use config::{ActionInputs, ConfigError, RunnerContext};
pub use distribution::{DistType, DistributionUrl, extract_version};
pub use engine::{BestEffort, ChecksumPolicy, LauncherDigest, UpdateEngine, UpdateReport};
pub use errors::{ErrorCode, UpdateError};
pub use logging::{LogConfig, LogFormat, init_logging};
pub use release::{HttpReleaseSource, ReleaseDescriptor, ReleaseSource};
pub use verify::{CommandOutput, GradlewRunner, VerificationStep, WrapperRunner};
pub use wrapper::{FileEncoding, WrapperConfig};
