//! Gradle Wrapper Updater
//!
//! Runs inside a GitHub Actions job: finds every Gradle Wrapper in the
//! checkout, moves it to the latest Gradle release, verifies the result and
//! opens a pull request with one commit per updated wrapper.

#![forbid(unsafe_code)]

mod commit;
mod discovery;
mod git;
mod github;
mod runner;

use anyhow::Result;
use clap::Parser;
use gwu_common::{
    ActionInputs, ChecksumPolicy, GradlewRunner, HttpReleaseSource, LogConfig, LogFormat,
    RunnerContext, UpdateError, init_logging,
};
use gwu_common::config::Sourced;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::discovery::GlobDiscovery;
use crate::git::GitCli;
use crate::github::{GitHubOps, GitHubSettings};
use crate::runner::{RunOutcome, RunSettings, UpdateRunner};

#[derive(Parser)]
#[command(name = "gwu")]
#[command(author, version, about = "Update Gradle Wrappers and open a pull request")]
struct Cli {
    /// Checkout to scan for wrappers
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log line format: compact, pretty or json
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Never pin distributionSha256Sum, whatever the action input says
    #[arg(long)]
    no_distribution_checksum: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info");
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(&log_config)?;

    let mut inputs = ActionInputs::from_env()?;
    let context = RunnerContext::from_env()?;

    if cli.no_distribution_checksum {
        inputs.set_distribution_checksum = Sourced::from_cli(false);
    }
    let policy = ChecksumPolicy::from_pin_flag(inputs.set_distribution_checksum.value);
    debug!(
        ?policy,
        source = %inputs.set_distribution_checksum.describe_source(),
        "Checksum policy"
    );

    let (owner, repo) = context.owner_and_name();
    let github = GitHubOps::new(GitHubSettings {
        api_url: context.api_url.value.clone(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        token: inputs.repo_token.value.clone(),
        reviewers: inputs.reviewers.value.clone(),
        team_reviewers: inputs.team_reviewers.value.clone(),
        labels: inputs.labels.value.clone(),
        base_branch: inputs.base_branch.value.clone(),
    })?;

    let runner = UpdateRunner::new(
        GlobDiscovery,
        GitCli::new(&cli.root),
        HttpReleaseSource::new()?,
        github,
        GradlewRunner,
        RunSettings {
            root: cli.root.clone(),
            base_revision: context.sha.value.clone(),
            policy,
        },
    );

    match runner.run().await {
        Ok(RunOutcome::Opened { url, commits }) => {
            info!(commits, "Done");
            println!("{url}");
            Ok(())
        }
        Ok(RunOutcome::AlreadyRequested(existing)) => {
            info!(reference = %existing.reference, "Nothing to do");
            Ok(())
        }
        Ok(RunOutcome::UpToDate { version }) => {
            info!(version = %version, "Nothing to do");
            Ok(())
        }
        Ok(RunOutcome::NoWrappers) => Ok(()),
        Err(err) => {
            if let Some(update) = err.downcast_ref::<UpdateError>() {
                let code = update.code();
                error!(code = %code, remediation = code.remediation(), "{err:#}");
            } else {
                error!("{err:#}");
            }
            Err(err)
        }
    }
}
