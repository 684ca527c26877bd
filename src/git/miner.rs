//! Commit mining through the `git` command line.
//!
//! One `git log -p` per repository, filtered by author aliases and date
//! range. The output is read with a record/unit-separator pretty format so
//! commit headers can be told apart from diff text without guessing.

use std::process::Command;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

use crate::data::{AuthorAliases, DateRange};
use crate::git::error::MinerError;
use crate::git::repository::RepoTarget;
use crate::git::SHORT_HASH_LEN;

const RECORD_SEPARATOR: char = '\x1e';
const FIELD_SEPARATOR: char = '\x1f';

/// `%x1e` starts each commit; fields are `%x1f`-separated with the subject
/// last so it may contain anything else.
const LOG_FORMAT: &str = "--pretty=format:%x1e%H%x1f%an%x1f%ae%x1f%aI%x1f%s";

/// One commit as mined from `git log -p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Display name of the repository the commit came from.
    pub repo: String,
    /// Full commit hash.
    pub hash: String,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp with the author's UTC offset.
    pub date: DateTime<FixedOffset>,
    /// First line of the commit message.
    pub subject: String,
    /// Unified diff against the first parent.
    pub diff: String,
}

impl CommitRecord {
    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(SHORT_HASH_LEN)]
    }
}

/// Mines `target` for commits by any of `aliases` within `range`.
///
/// Commits are returned oldest first. An empty result is reported as
/// [`MinerError::NoCommits`] so the caller can skip the repository.
pub fn mine_repository(
    target: &RepoTarget,
    aliases: &AuthorAliases,
    range: &DateRange,
) -> Result<Vec<CommitRecord>, MinerError> {
    let workdir = target.open()?;
    let args = build_log_args(aliases, range);

    debug!(repo = %target.name(), workdir = %workdir.display(), ?args, "Running git log");

    let output = Command::new("git")
        .args(&args)
        .current_dir(&workdir)
        .output()
        .map_err(MinerError::GitUnavailable)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // A repository without any commit has no HEAD to log from.
        if stderr.contains("does not have any commits") {
            return Err(MinerError::NoCommits {
                repo: target.name().to_string(),
            });
        }
        return Err(MinerError::GitCommandFailed {
            repo: target.name().to_string(),
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed = parse_log_output(target.name(), &stdout);
    let total = parsed.len();

    let mut commits: Vec<CommitRecord> = parsed
        .into_iter()
        .filter(|c| aliases.matches(&c.author_name, &c.author_email))
        .filter(|c| range.contains(c.date.date_naive()))
        .collect();

    if commits.len() != total {
        debug!(
            repo = %target.name(),
            dropped = total - commits.len(),
            "Dropped commits outside alias/date filters"
        );
    }

    if commits.is_empty() {
        return Err(MinerError::NoCommits {
            repo: target.name().to_string(),
        });
    }

    // git lists newest first; reverse, then a stable sort keeps git's order
    // for commits sharing a timestamp.
    commits.reverse();
    commits.sort_by_key(|c| c.date);

    info!(repo = %target.name(), commits = commits.len(), "Mined commits");
    Ok(commits)
}

/// Arguments for the `git log` invocation, without the program name.
pub fn build_log_args(aliases: &AuthorAliases, range: &DateRange) -> Vec<String> {
    // Section splitting relies on `a/` and `b/` header prefixes, whatever
    // the user's diff configuration says.
    let mut args = vec![
        "-c".to_string(),
        "core.quotepath=off".to_string(),
        "-c".to_string(),
        "diff.noprefix=false".to_string(),
        "-c".to_string(),
        "diff.mnemonicPrefix=false".to_string(),
        "log".to_string(),
        "-p".to_string(),
        "--no-color".to_string(),
        "--no-merges".to_string(),
        "--no-ext-diff".to_string(),
        "--src-prefix=a/".to_string(),
        "--dst-prefix=b/".to_string(),
        "--regexp-ignore-case".to_string(),
        "--fixed-strings".to_string(),
        format!("--since={}", range.git_since()),
        LOG_FORMAT.to_string(),
    ];
    args.extend(aliases.iter().map(|alias| format!("--author={alias}")));
    args
}

/// Parses `git log -p` output produced with [`LOG_FORMAT`].
///
/// Malformed records are logged and skipped.
pub fn parse_log_output(repo: &str, output: &str) -> Vec<CommitRecord> {
    output
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| match parse_record(repo, record) {
            Some(commit) => Some(commit),
            None => {
                warn!(repo, "Skipping unparseable git log record");
                None
            }
        })
        .collect()
}

fn parse_record(repo: &str, record: &str) -> Option<CommitRecord> {
    let (header, body) = record.split_once('\n').unwrap_or((record, ""));
    let mut fields = header.splitn(5, FIELD_SEPARATOR);

    let hash = fields.next()?.trim().to_string();
    let author_name = fields.next()?.to_string();
    let author_email = fields.next()?.to_string();
    let date = DateTime::parse_from_rfc3339(fields.next()?.trim()).ok()?;
    let subject = fields.next()?.trim_end().to_string();

    if hash.is_empty() {
        return None;
    }

    Some(CommitRecord {
        repo: repo.to_string(),
        hash,
        author_name,
        author_email,
        date,
        subject,
        diff: body.trim_start_matches('\n').trim_end().to_string(),
    })
}
