//! Locating wrapper files in a checkout.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Relative location of a wrapper's properties file inside its project.
pub const WRAPPER_GLOB: &str = "**/gradle/wrapper/gradle-wrapper.properties";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Root path is not valid UTF-8: {}", .0.display())]
    NonUtf8Root(PathBuf),

    #[error("Invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Finds wrapper properties files below a root. Mocked in tests.
pub trait FileDiscovery {
    fn find(&self, root: &Path) -> Result<Vec<PathBuf>, DiscoveryError>;
}

/// Glob-based discovery that never follows symbolic links.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobDiscovery;

impl FileDiscovery for GlobDiscovery {
    fn find(&self, root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
        let root_str = root
            .to_str()
            .ok_or_else(|| DiscoveryError::NonUtf8Root(root.to_path_buf()))?;
        let pattern = format!("{}/{WRAPPER_GLOB}", glob::Pattern::escape(root_str));

        let mut found = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if reached_through_symlink(root, &path) => {
                    debug!(path = %path.display(), "Skipping wrapper behind a symbolic link");
                }
                Ok(path) => found.push(path),
                Err(e) => debug!(error = %e, "Skipping unreadable path"),
            }
        }
        found.sort();
        debug!(count = found.len(), root = %root.display(), "Wrappers discovered");
        Ok(found)
    }
}

/// True when `path` or any directory between `root` and it is a symlink.
fn reached_through_symlink(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let mut current = root.to_path_buf();
    relative.components().any(|component| {
        current.push(component);
        current
            .symlink_metadata()
            .is_ok_and(|meta| meta.file_type().is_symlink())
    })
}
