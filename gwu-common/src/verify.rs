//! Running a project's wrapper and checking what it reports.
//!
//! A properties file can parse cleanly and still point at a release that
//! does not exist, or carry a checksum that does not match the archive. The
//! only proof that an update works is running `gradlew --version` and reading
//! the version back.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::errors::{Result, UpdateError};
use crate::wrapper::WrapperConfig;

static GRADLE_VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Gradle\s+(\S+)\s*$").expect("static regex is valid")
});

/// Captured result of one wrapper invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Executes a project's wrapper. Mocked in tests.
pub trait WrapperRunner {
    /// Run the wrapper of `project_dir` with `args`.
    ///
    /// Returns `ExecutionFailure` only when the process cannot be started.
    /// A non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, project_dir: &Path, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs the checked-in `gradlew` script (`gradlew.bat` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct GradlewRunner;

impl GradlewRunner {
    pub const fn script_name() -> &'static str {
        if cfg!(windows) { "gradlew.bat" } else { "gradlew" }
    }

    /// Absolute path of the script, so `current_dir` cannot change what runs.
    fn script_path(project_dir: &Path) -> Result<PathBuf> {
        let dir = fs::canonicalize(project_dir).map_err(|e| UpdateError::ExecutionFailure {
            project_dir: project_dir.to_path_buf(),
            reason: format!("cannot resolve project directory: {e}"),
        })?;
        Ok(dir.join(Self::script_name()))
    }
}

impl WrapperRunner for GradlewRunner {
    fn run(&self, project_dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        let script = Self::script_path(project_dir)?;
        debug!(script = %script.display(), ?args, "Running wrapper");

        let output = Command::new(&script)
            .args(args)
            .current_dir(project_dir)
            .output()
            .map_err(|e| UpdateError::ExecutionFailure {
                project_dir: project_dir.to_path_buf(),
                reason: format!("cannot start {}: {e}", script.display()),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Version printed by `gradlew --version`, if any.
pub fn reported_version(stdout: &str) -> Option<&str> {
    GRADLE_VERSION_LINE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Asserts that an updated wrapper runs and reports the pinned version.
pub struct VerificationStep<'a, R: WrapperRunner> {
    runner: &'a R,
}

impl<'a, R: WrapperRunner> VerificationStep<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    pub fn verify(&self, config: &WrapperConfig) -> Result<()> {
        let project_dir = config.project_dir();
        let output = self.runner.run(&project_dir, &["--version"])?;
        debug!(stdout = %output.stdout, stderr = %output.stderr, "Wrapper output");

        if !output.success {
            let code = output
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(UpdateError::ExecutionFailure {
                project_dir,
                reason: format!("gradlew --version exited with {code}: {}", output.stderr.trim()),
            });
        }

        let reported = reported_version(&output.stdout);
        if reported != Some(config.version()) {
            return Err(UpdateError::VersionMismatch {
                expected: config.version().to_string(),
                reported: reported.map(str::to_string),
            });
        }

        info!(version = config.version(), "Wrapper verified");
        Ok(())
    }
}
