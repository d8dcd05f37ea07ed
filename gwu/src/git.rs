//! Version control through the `git` command-line tool.

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

use crate::commit::CommitMessage;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} exited with {code}: {stderr}")]
    Failed {
        args: String,
        code: String,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Operations the updater performs on the checkout. Mocked in tests.
pub trait VersionControl {
    fn configure_identity(&self, name: &str, email: &str) -> Result<()>;

    /// Create and switch to `name`, starting at `base_revision`.
    fn create_branch(&self, name: &str, base_revision: &str) -> Result<()>;

    /// Tracked files with uncommitted modifications under the working
    /// directory, relative to it. Changes outside it are not listed.
    fn list_changed_files(&self) -> Result<Vec<String>>;

    fn commit(&self, files: &[String], message: &CommitMessage) -> Result<()>;

    fn push(&self, branch: &str) -> Result<()>;
}

/// [`VersionControl`] over the `git` binary, run inside `workdir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: "origin".to_string(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let joined = args.join(" ");
        debug!(args = %joined, "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| GitError::Spawn {
                args: joined.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::Failed {
                args: joined,
                code: output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.git(&["config", "user.name", name])?;
        self.git(&["config", "user.email", email])?;
        Ok(())
    }

    fn create_branch(&self, name: &str, base_revision: &str) -> Result<()> {
        self.git(&["checkout", "-b", name, base_revision])?;
        info!(branch = name, base = base_revision, "Branch created");
        Ok(())
    }

    fn list_changed_files(&self) -> Result<Vec<String>> {
        let stdout = self.git(&["diff", "--name-only", "--relative"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn commit(&self, files: &[String], message: &CommitMessage) -> Result<()> {
        let mut add = vec!["add", "--"];
        add.extend(files.iter().map(String::as_str));
        self.git(&add)?;

        let mut commit = vec!["commit", "--quiet", "-m", message.subject.as_str()];
        if let Some(body) = message.body.as_deref() {
            commit.extend(["-m", body]);
        }
        self.git(&commit)?;
        info!(files = files.len(), subject = %message.subject, "Committed");
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.git(&["push", "--set-upstream", self.remote.as_str(), refspec.as_str()])?;
        info!(branch, remote = %self.remote, "Branch pushed");
        Ok(())
    }
}
