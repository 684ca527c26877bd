//! Commit mining errors.

use thiserror::Error;

/// Errors raised while mining one repository.
///
/// All but [`MinerError::GitUnavailable`] are scoped to a single repository:
/// the run logs them and moves on to the next target.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The path does not exist or is not a git working copy.
    #[error("Repository not found: {path}")]
    RepoNotFound {
        /// Path as given on the command line.
        path: String,
    },

    /// No commit matched the aliases within the date range.
    #[error("No commits by the given aliases in range for repository {repo}")]
    NoCommits {
        /// Repository display name.
        repo: String,
    },

    /// `git log` ran but exited unsuccessfully.
    #[error("git log failed in {repo}: {stderr}")]
    GitCommandFailed {
        /// Repository display name.
        repo: String,
        /// Trimmed stderr from git.
        stderr: String,
    },

    /// The `git` executable could not be started.
    #[error("Failed to run git. Is it installed and on PATH? ({0})")]
    GitUnavailable(#[source] std::io::Error),
}

impl MinerError {
    /// True when the error only affects the repository it came from.
    pub fn is_repo_scoped(&self) -> bool {
        !matches!(self, Self::GitUnavailable(_))
    }
}
