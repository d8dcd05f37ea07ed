//! Configuration for an update run.
//!
//! Inputs arrive through the environment the way GitHub Actions passes them:
//! - action inputs as `INPUT_*` variables ([`ActionInputs`])
//! - runner context as `GITHUB_*` variables ([`RunnerContext`])

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use thiserror::Error;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Invalid or missing configuration. Lists every problem found.
#[derive(Debug, Error)]
#[error("Invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ConfigError(pub Vec<EnvError>);

/// Inputs declared by the action.
#[derive(Debug, Clone)]
pub struct ActionInputs {
    /// Token used for GitHub API calls.
    pub repo_token: Sourced<String>,
    /// Pin `distributionSha256Sum` to the release checksum.
    pub set_distribution_checksum: Sourced<bool>,
    /// Users requested as reviewers on the pull request.
    pub reviewers: Sourced<Vec<String>>,
    /// Teams requested as reviewers on the pull request.
    pub team_reviewers: Sourced<Vec<String>>,
    /// Labels added to the pull request.
    pub labels: Sourced<Vec<String>>,
    /// Branch the pull request targets. Repository default when unset.
    pub base_branch: Sourced<Option<String>>,
}

impl ActionInputs {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut parser = EnvParser::inputs();
        let inputs = Self {
            repo_token: parser.get_required("REPO-TOKEN"),
            set_distribution_checksum: parser.get_bool("SET-DISTRIBUTION-CHECKSUM", true),
            reviewers: parser.get_string_list("REVIEWERS"),
            team_reviewers: parser.get_string_list("TEAM-REVIEWERS"),
            labels: parser.get_string_list("LABELS"),
            base_branch: parser.get_optional_string("BASE-BRANCH"),
        };
        if parser.has_errors() {
            return Err(ConfigError(parser.take_errors()));
        }
        Ok(inputs)
    }
}

/// Context of the triggering workflow run.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    /// `owner/name` of the repository.
    pub repository: Sourced<String>,
    /// Commit the run was triggered for; the working branch starts here.
    pub sha: Sourced<String>,
    pub api_url: Sourced<String>,
}

impl RunnerContext {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut parser = EnvParser::with_prefix("GITHUB_");
        let repository = parser.get_required("REPOSITORY");
        if !repository.value.is_empty() && !is_owner_and_name(&repository.value) {
            parser.take_errors();
            return Err(ConfigError(vec![EnvError::InvalidValue {
                var: "GITHUB_REPOSITORY".to_string(),
                expected: "owner/name".to_string(),
                value: repository.value,
            }]));
        }
        let context = Self {
            repository,
            sha: parser.get_required("SHA"),
            api_url: parser.get_string("API_URL", DEFAULT_API_URL),
        };
        if parser.has_errors() {
            return Err(ConfigError(parser.take_errors()));
        }
        Ok(context)
    }

    /// `(owner, name)` split of [`RunnerContext::repository`].
    pub fn owner_and_name(&self) -> (&str, &str) {
        self.repository
            .value
            .split_once('/')
            .unwrap_or((self.repository.value.as_str(), ""))
    }
}

fn is_owner_and_name(repository: &str) -> bool {
    matches!(repository.split_once('/'), Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
