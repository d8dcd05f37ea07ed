//! Rewriting a wrapper to point at a new release.
//!
//! [`UpdateEngine::update`] computes the target configuration, writes it to
//! the backing file, and then gives the project's own launcher a chance to
//! refresh its jar and scripts. That last step is best-effort: its outcome is
//! logged and returned, never raised. Verification is what decides whether the
//! update worked.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::{Result, UpdateError};
use crate::release::ReleaseDescriptor;
use crate::verify::WrapperRunner;
use crate::wrapper::WrapperConfig;

/// What to do with `distributionSha256Sum` during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Set the checksum of the release archive matching the wrapper's kind.
    Pin,
    /// Leave an existing checksum alone, never add one.
    Preserve,
    /// Drop the checksum entry.
    Remove,
}

impl ChecksumPolicy {
    /// Policy for the "set distribution checksum" switch.
    pub const fn from_pin_flag(pin: bool) -> Self {
        if pin { Self::Pin } else { Self::Preserve }
    }
}

/// Outcome of a call whose failure must not stop the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Completed,
    Skipped(String),
    Failed(String),
}

impl BestEffort {
    /// Log the outcome under `action`. Failures go to `warn`.
    pub fn log(&self, action: &str) {
        match self {
            Self::Completed => debug!(action, "Completed"),
            Self::Skipped(reason) => debug!(action, reason = %reason, "Skipped"),
            Self::Failed(reason) => warn!(action, reason = %reason, "Failed, continuing"),
        }
    }
}

/// Comparison of the checked-in launcher jar with the release's jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherDigest {
    Matches,
    Differs { actual: String },
    /// No jar on disk or no published checksum.
    Unknown,
}

impl fmt::Display for LauncherDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matches => f.write_str("matches release"),
            Self::Differs { actual } => write!(f, "differs from release (sha256 {actual})"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Summary of one successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub previous_version: String,
    pub version: String,
    pub launcher_refresh: BestEffort,
    pub launcher_digest: LauncherDigest,
}

/// Applies a [`ReleaseDescriptor`] to wrapper configurations.
pub struct UpdateEngine<'a, R: WrapperRunner> {
    runner: &'a R,
    policy: ChecksumPolicy,
}

impl<'a, R: WrapperRunner> UpdateEngine<'a, R> {
    pub fn new(runner: &'a R, policy: ChecksumPolicy) -> Self {
        Self { runner, policy }
    }

    /// Configuration `config` should have after updating to `release`.
    ///
    /// The host, path and distribution kind of the URL never change.
    pub fn target_config(
        &self,
        config: &WrapperConfig,
        release: &ReleaseDescriptor,
    ) -> Result<WrapperConfig> {
        let mut next = config.clone();
        next.distribution_url = config.distribution_url.with_version(&release.version);
        match self.policy {
            ChecksumPolicy::Pin => {
                let checksum = release.checksum_for(config.dist_type()).ok_or_else(|| {
                    UpdateError::MissingChecksum {
                        version: release.version.clone(),
                        dist_type: config.dist_type(),
                    }
                })?;
                next.distribution_checksum = Some(checksum.to_string());
            }
            ChecksumPolicy::Preserve => {}
            ChecksumPolicy::Remove => next.distribution_checksum = None,
        }
        Ok(next)
    }

    /// Rewrite `config` and its backing file for `release`.
    ///
    /// Callers skip wrappers already at `release.version`.
    pub fn update(
        &self,
        config: &mut WrapperConfig,
        release: &ReleaseDescriptor,
    ) -> Result<UpdateReport> {
        let previous_version = config.version().to_string();
        let bytes = self.target_config(config, release)?.to_bytes();

        let path = config.path().to_path_buf();
        fs::write(&path, &bytes).map_err(|source| UpdateError::WriteFailure {
            path: path.clone(),
            source,
        })?;
        *config = WrapperConfig::from_bytes(path, bytes)?;
        info!(
            from = %previous_version,
            to = %config.version(),
            dist_type = %config.dist_type(),
            checksum = config.distribution_checksum.is_some(),
            "Wrapper properties rewritten"
        );

        let launcher_refresh = self.refresh_launcher(config);
        launcher_refresh.log("launcher refresh");

        let launcher_digest = launcher_digest(&config.project_dir(), &release.wrapper_checksum);
        info!(launcher = %launcher_digest, "Launcher jar checked");

        Ok(UpdateReport {
            previous_version,
            version: config.version().to_string(),
            launcher_refresh,
            launcher_digest,
        })
    }

    /// Let the project's launcher regenerate its jar and scripts.
    ///
    /// Only runs when a launcher jar was previously bootstrapped into the
    /// project. The wrapper task rewrites the properties from its arguments,
    /// so they repeat every value just written, including a checksum kept
    /// under [`ChecksumPolicy::Preserve`].
    fn refresh_launcher(&self, config: &WrapperConfig) -> BestEffort {
        let project_dir = config.project_dir();
        let jar = launcher_jar(&project_dir);
        if !jar.is_file() {
            return BestEffort::Skipped(format!("no launcher at {}", jar.display()));
        }

        let mut args = vec![
            "wrapper",
            "--gradle-version",
            config.version(),
            "--distribution-type",
            config.dist_type().as_str(),
        ];
        if let Some(checksum) = config.distribution_checksum.as_deref() {
            args.extend(["--gradle-distribution-sha256-sum", checksum]);
        }

        match self.runner.run(&project_dir, &args) {
            Ok(output) if output.success => BestEffort::Completed,
            Ok(output) => BestEffort::Failed(format!(
                "gradlew wrapper exited with {:?}: {}",
                output.code,
                output.stderr.trim()
            )),
            Err(e) => BestEffort::Failed(e.to_string()),
        }
    }
}

/// `gradle/wrapper/gradle-wrapper.jar` under `project_dir`.
pub fn launcher_jar(project_dir: &Path) -> PathBuf {
    project_dir
        .join("gradle")
        .join("wrapper")
        .join("gradle-wrapper.jar")
}

/// Compare the SHA-256 of the project's launcher jar with `expected`.
pub fn launcher_digest(project_dir: &Path, expected: &str) -> LauncherDigest {
    if expected.is_empty() {
        return LauncherDigest::Unknown;
    }
    let Ok(bytes) = fs::read(launcher_jar(project_dir)) else {
        return LauncherDigest::Unknown;
    };
    let actual = format!("{:x}", Sha256::digest(&bytes));
    if actual.eq_ignore_ascii_case(expected.trim()) {
        LauncherDigest::Matches
    } else {
        LauncherDigest::Differs { actual }
    }
}
