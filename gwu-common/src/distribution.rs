//! Structured matcher for Gradle distribution URLs.
//!
//! A distribution URL has the shape
//! `<scheme>://<host>/.../distributions/gradle-<version>-<bin|all>.zip`.
//! [`DistributionUrl`] splits it into the part that never changes (everything
//! before the file name), the version, and the distribution kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, UpdateError};

const FILE_PREFIX: &str = "gradle-";
const FILE_SUFFIX: &str = ".zip";
const DISTRIBUTIONS_DIR: &str = "distributions";

/// Distribution kind pinned by a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistType {
    /// Binaries only.
    Bin,
    /// Binaries plus sources and documentation.
    All,
}

impl DistType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bin" => Ok(Self::Bin),
            "all" => Ok(Self::All),
            other => Err(format!("unknown distribution type '{other}'")),
        }
    }
}

/// Parsed `distributionUrl` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionUrl {
    /// Everything up to and including the last `/`.
    base: String,
    version: String,
    dist_type: DistType,
}

impl DistributionUrl {
    /// Parse a full distribution URL.
    ///
    /// Requires a `scheme://host` prefix and a `distributions` directory right
    /// above the file name, on top of what [`extract_version`] checks.
    pub fn parse(url: &str) -> Result<Self> {
        let unparsable = || UpdateError::UnparsableVersion {
            url: url.to_string(),
        };

        let (scheme, rest) = url.split_once("://").ok_or_else(unparsable)?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c)) {
            return Err(unparsable());
        }
        let (dir, file) = rest.rsplit_once('/').ok_or_else(unparsable)?;
        let (host, _) = dir.split_once('/').unwrap_or((dir, ""));
        if host.is_empty() || dir.rsplit('/').next() != Some(DISTRIBUTIONS_DIR) {
            return Err(unparsable());
        }

        let (version, dist_type) = split_file_name(file).ok_or_else(unparsable)?;
        Ok(Self {
            base: url[..url.len() - file.len()].to_string(),
            version: version.to_string(),
            dist_type,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dist_type(&self) -> DistType {
        self.dist_type
    }

    /// Same host, path and kind, pointing at `version`.
    #[must_use]
    pub fn with_version(&self, version: &str) -> Self {
        Self {
            base: self.base.clone(),
            version: version.to_string(),
            dist_type: self.dist_type,
        }
    }
}

impl fmt::Display for DistributionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FILE_PREFIX}{}-{}{FILE_SUFFIX}",
            self.base, self.version, self.dist_type
        )
    }
}

/// Extract the version token from a distribution URL's file name.
pub fn extract_version(url: &str) -> Result<String> {
    let file = url.rsplit('/').next().unwrap_or(url);
    split_file_name(file)
        .map(|(version, _)| version.to_string())
        .ok_or_else(|| UpdateError::UnparsableVersion {
            url: url.to_string(),
        })
}

/// `gradle-<version>-<bin|all>.zip` → (version, kind).
fn split_file_name(file: &str) -> Option<(&str, DistType)> {
    let stem = file.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let (version, kind) = stem.rsplit_once('-')?;
    let dist_type = kind.parse().ok()?;
    if !is_version_token(version) {
        return None;
    }
    Some((version, dist_type))
}

fn is_version_token(version: &str) -> bool {
    version.starts_with(|c: char| c.is_ascii_digit())
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
}
