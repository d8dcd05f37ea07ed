//! The batch loop: one release, every wrapper, at most one pull request.
//!
//! Wrappers are handled one at a time in discovery order. The first error
//! aborts the run. Commits made for earlier wrappers stay on the local
//! branch, but nothing is pushed and no pull request is opened, so a
//! partially updated branch never reaches the remote.

use anyhow::{Context, Result};
use gwu_common::{
    ChecksumPolicy, ReleaseDescriptor, ReleaseSource, UpdateEngine, VerificationStep,
    WrapperConfig, WrapperRunner,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

use crate::commit::{COMMITTER_EMAIL, COMMITTER_NAME, branch_name, commit_message};
use crate::discovery::FileDiscovery;
use crate::git::VersionControl;
use crate::github::{ChangeRequestService, ExistingRequest};

/// Inputs of one run that are not collaborators.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Checkout scanned for wrappers.
    pub root: PathBuf,
    /// Commit the working branch starts from.
    pub base_revision: String,
    pub policy: ChecksumPolicy,
}

/// How a run ended when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A branch for this release already exists upstream.
    AlreadyRequested(ExistingRequest),
    NoWrappers,
    /// Every wrapper already pins `version`.
    UpToDate { version: String },
    Opened { url: String, commits: usize },
}

/// A wrapper updated and committed during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperCommit {
    pub path: PathBuf,
    pub source_version: String,
    pub files: Vec<String>,
}

pub struct UpdateRunner<D, V, S, C, W> {
    discovery: D,
    vcs: V,
    releases: S,
    requests: C,
    wrapper: W,
    settings: RunSettings,
}

impl<D, V, S, C, W> UpdateRunner<D, V, S, C, W>
where
    D: FileDiscovery,
    V: VersionControl,
    S: ReleaseSource,
    C: ChangeRequestService,
    W: WrapperRunner,
{
    pub fn new(
        discovery: D,
        vcs: V,
        releases: S,
        requests: C,
        wrapper: W,
        settings: RunSettings,
    ) -> Self {
        Self {
            discovery,
            vcs,
            releases,
            requests,
            wrapper,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let release = self
            .releases
            .fetch_latest()
            .await
            .context("Fetching the latest Gradle release")?;
        info!(version = %release.version, "Latest release");

        if let Some(existing) = self
            .requests
            .find_existing_request(&release.version)
            .await
            .context("Looking for an existing pull request")?
        {
            warn!(
                version = %release.version,
                reference = %existing.reference,
                "A pull request already exists that updates Gradle Wrapper to this release"
            );
            return Ok(RunOutcome::AlreadyRequested(existing));
        }

        let wrappers = self.discovery.find(&self.settings.root)?;
        if wrappers.is_empty() {
            warn!(root = %self.settings.root.display(), "Unable to find Gradle Wrapper files");
            return Ok(RunOutcome::NoWrappers);
        }
        debug!(count = wrappers.len(), "Wrappers found");

        self.vcs.configure_identity(COMMITTER_NAME, COMMITTER_EMAIL)?;
        let branch = branch_name(&release.version);
        self.vcs
            .create_branch(&branch, &self.settings.base_revision)?;

        let mut commits = Vec::new();
        for path in &wrappers {
            let span = info_span!("wrapper", path = %path.display());
            let commit = span
                .in_scope(|| self.process_wrapper(path, &release))
                .with_context(|| format!("Updating wrapper {}", path.display()))?;
            commits.extend(commit);
        }

        if commits.is_empty() {
            warn!(version = %release.version, "Gradle Wrapper is already up-to-date");
            return Ok(RunOutcome::UpToDate {
                version: release.version,
            });
        }
        for commit in &commits {
            debug!(
                path = %commit.path.display(),
                from = %commit.source_version,
                files = commit.files.len(),
                "Commit added"
            );
        }

        self.vcs.push(&branch)?;

        let source = match commits.as_slice() {
            [only] => Some(only.source_version.as_str()),
            _ => None,
        };
        let url = self
            .requests
            .open_request(&branch, &release.version, source)
            .await
            .context("Creating the pull request")?;
        info!(url = %url, "Pull request created");

        Ok(RunOutcome::Opened {
            url,
            commits: commits.len(),
        })
    }

    /// Update, verify and commit one wrapper. `None` when nothing changed.
    fn process_wrapper(
        &self,
        path: &Path,
        release: &ReleaseDescriptor,
    ) -> Result<Option<WrapperCommit>> {
        let mut config = WrapperConfig::load(path)?;
        let source_version = config.version().to_string();
        debug!(version = %source_version, "Current wrapper version");

        if source_version == release.version {
            info!("Wrapper is already up-to-date");
            return Ok(None);
        }

        let engine = UpdateEngine::new(&self.wrapper, self.settings.policy);
        engine.update(&mut config, release)?;

        let files = self.vcs.list_changed_files()?;
        debug!(?files, "Modified files");
        if files.is_empty() {
            info!("Nothing to update for this wrapper");
            return Ok(None);
        }

        VerificationStep::new(&self.wrapper).verify(&config)?;

        self.vcs
            .commit(&files, &commit_message(&source_version, &release.version))?;

        Ok(Some(WrapperCommit {
            path: path.to_path_buf(),
            source_version,
            files,
        }))
    }
}
