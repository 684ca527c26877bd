//! Repository targets.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::git::error::MinerError;

/// A local git working copy to mine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    path: PathBuf,
    name: String,
}

impl RepoTarget {
    /// Creates a target for `path`. Nothing is checked until [`open`](Self::open).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = display_name(&path);
        Self { path, name }
    }

    /// Path as given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short name used in the aggregated context and logs: the final
    /// component of the canonical path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens the repository with libgit2 to confirm it is a working copy.
    ///
    /// Returns the working directory the `git` subprocess should run in.
    pub fn open(&self) -> Result<PathBuf, MinerError> {
        let not_found = || MinerError::RepoNotFound {
            path: self.path.display().to_string(),
        };

        if !self.path.is_dir() {
            return Err(not_found());
        }

        let repo = Repository::open(&self.path).map_err(|e| {
            debug!(path = %self.path.display(), error = %e, "Failed to open repository");
            not_found()
        })?;

        match repo.workdir() {
            Some(workdir) => Ok(workdir.to_path_buf()),
            None => Ok(repo.path().to_path_buf()),
        }
    }
}

fn display_name(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string())
}
