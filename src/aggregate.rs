//! Joins filtered diffs from every repository into the single text block
//! sent to the model.
//!
//! Repository and commit boundaries are marked so the model can attribute
//! changes to a project. The result is held under a character budget by
//! evicting the oldest commits first; the newest commit is truncated as a
//! last resort.

use tracing::{debug, warn};

use crate::git::{CommitRecord, FilteredDiff};

/// Placeholder for commits whose every file section was filtered out.
const ALL_EXCLUDED: &str = "(all changes in this commit were excluded as noise)";

/// Appended to a commit block cut short by the budget.
const TRUNCATION_MARKER: &str = "\n[... truncated ...]\n";

/// A mined commit with its noise-filtered diff.
#[derive(Debug, Clone)]
pub struct FilteredCommit {
    /// The commit as mined.
    pub record: CommitRecord,
    /// Its diff after exclusion filtering.
    pub diff: FilteredDiff,
}

/// All filtered commits from one repository, oldest first.
#[derive(Debug, Clone)]
pub struct RepoCommits {
    /// Repository display name.
    pub repo: String,
    /// Commits in chronological order.
    pub commits: Vec<FilteredCommit>,
}

/// The aggregated context plus bookkeeping about what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedContext {
    /// Text sent to the model.
    pub text: String,
    /// Commits present in `text`.
    pub included_commits: usize,
    /// Commits dropped to meet the budget.
    pub evicted_commits: usize,
    /// Whether the newest commit had to be cut short.
    pub truncated: bool,
}

impl AggregatedContext {
    /// Character count of the context.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Builds the aggregated context under a character budget.
#[derive(Debug, Clone, Copy)]
pub struct DiffAggregator {
    max_chars: usize,
}

struct RenderedRepo {
    header: String,
    header_len: usize,
    blocks: Vec<(String, usize)>,
}

impl DiffAggregator {
    /// Creates an aggregator that keeps output within `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Configured budget.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Concatenates every repository's commits in the order given.
    pub fn aggregate(&self, repos: &[RepoCommits]) -> AggregatedContext {
        let rendered: Vec<RenderedRepo> = repos
            .iter()
            .map(|repo| {
                let header = format!("=== REPOSITORY: {} ===\n", repo.repo);
                let blocks = repo
                    .commits
                    .iter()
                    .map(|commit| {
                        let block = render_commit(commit);
                        let len = block.chars().count();
                        (block, len)
                    })
                    .collect();
                RenderedRepo {
                    header_len: header.chars().count(),
                    header,
                    blocks,
                }
            })
            .collect();

        let mut retained: Vec<Vec<bool>> = rendered
            .iter()
            .map(|r| vec![true; r.blocks.len()])
            .collect();
        let total_commits: usize = retained.iter().map(Vec::len).sum();

        // Oldest first; the sort is stable so ties keep repository order.
        let mut eviction_order: Vec<(usize, usize)> = repos
            .iter()
            .enumerate()
            .flat_map(|(r, repo)| (0..repo.commits.len()).map(move |c| (r, c)))
            .collect();
        eviction_order.sort_by_key(|&(r, c)| repos[r].commits[c].record.date);

        let mut evicted = 0;
        let mut order = eviction_order.iter();
        while measure(&rendered, &retained) > self.max_chars && evicted + 1 < total_commits {
            let Some(&(r, c)) = order.next() else {
                break;
            };
            retained[r][c] = false;
            evicted += 1;
        }

        let mut truncate_to = None;
        let size = measure(&rendered, &retained);
        if size > self.max_chars && total_commits > 0 {
            // Only the newest commit is left and it alone is too large.
            truncate_to = Some(size - self.max_chars);
        }

        if evicted > 0 {
            warn!(
                evicted,
                kept = total_commits - evicted,
                max_chars = self.max_chars,
                "Aggregated context over budget, dropped oldest commits"
            );
        }
        if truncate_to.is_some() {
            warn!(
                max_chars = self.max_chars,
                "Newest commit alone exceeds the context budget, truncating it"
            );
        }

        let mut text = render(&rendered, &retained, truncate_to);
        let mut clipped = false;
        if text.chars().count() > self.max_chars {
            // Budget smaller than the repository header plus the marker.
            text = text.chars().take(self.max_chars).collect();
            clipped = true;
        }
        debug!(
            chars = text.chars().count(),
            included = total_commits - evicted,
            evicted,
            "Aggregated diff context"
        );

        AggregatedContext {
            text,
            included_commits: total_commits - evicted,
            evicted_commits: evicted,
            truncated: truncate_to.is_some() || clipped,
        }
    }
}

fn render_commit(commit: &FilteredCommit) -> String {
    let record = &commit.record;
    let mut block = format!(
        "\n--- COMMIT {} | {} <{}> | {} ---\nMessage: {}\n",
        record.short_hash(),
        record.author_name,
        record.author_email,
        record.date.format("%Y-%m-%d %H:%M %:z"),
        record.subject
    );

    if !commit.diff.excluded_paths.is_empty() {
        block.push_str(&format!(
            "Excluded files: {}\n",
            commit.diff.excluded_paths.join(", ")
        ));
    }

    if commit.diff.is_empty() {
        block.push_str(ALL_EXCLUDED);
        block.push('\n');
    } else {
        block.push_str(commit.diff.text.trim_end());
        block.push('\n');
    }
    block
}

/// Character count of the output for the given retention mask.
fn measure(rendered: &[RenderedRepo], retained: &[Vec<bool>]) -> usize {
    let mut total = 0;
    let mut repos_with_content = 0usize;
    for (repo, keep) in rendered.iter().zip(retained) {
        let body: usize = repo
            .blocks
            .iter()
            .zip(keep)
            .filter(|(_, k)| **k)
            .map(|((_, len), _)| *len)
            .sum();
        if keep.iter().any(|k| *k) {
            total += repo.header_len + body;
            repos_with_content += 1;
        }
    }
    // One newline between repository sections.
    total + repos_with_content.saturating_sub(1)
}

fn render(rendered: &[RenderedRepo], retained: &[Vec<bool>], truncate_by: Option<usize>) -> String {
    let mut sections = Vec::new();
    for (repo, keep) in rendered.iter().zip(retained) {
        if !keep.iter().any(|k| *k) {
            continue;
        }
        let mut section = repo.header.clone();
        for ((block, len), _) in repo.blocks.iter().zip(keep).filter(|(_, k)| **k) {
            match truncate_by {
                Some(excess) => section.push_str(&truncate_block(block, *len, excess)),
                None => section.push_str(block),
            }
        }
        sections.push(section);
    }
    sections.join("\n")
}

/// Shortens `block` by `excess` characters plus room for the marker.
fn truncate_block(block: &str, len: usize, excess: usize) -> String {
    let keep = len.saturating_sub(excess + TRUNCATION_MARKER.chars().count());
    let mut out: String = block.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn commit(repo: &str, hash: &str, date: &str, diff: &str) -> FilteredCommit {
        FilteredCommit {
            record: CommitRecord {
                repo: repo.to_string(),
                hash: hash.to_string(),
                author_name: "Jane".to_string(),
                author_email: "jane@corp.com".to_string(),
                date: DateTime::parse_from_rfc3339(date).unwrap(),
                subject: format!("commit {hash}"),
                diff: diff.to_string(),
            },
            diff: FilteredDiff {
                text: diff.to_string(),
                excluded_paths: Vec::new(),
            },
        }
    }

    fn sample() -> Vec<RepoCommits> {
        vec![
            RepoCommits {
                repo: "api".to_string(),
                commits: vec![
                    commit("api", "a1", "2024-02-01T10:00:00Z", "diff --git a/x b/x\n+old\n"),
                    commit("api", "a2", "2024-02-20T10:00:00Z", "diff --git a/y b/y\n+new\n"),
                ],
            },
            RepoCommits {
                repo: "web".to_string(),
                commits: vec![commit(
                    "web",
                    "w1",
                    "2024-02-10T10:00:00Z",
                    "diff --git a/z b/z\n+mid\n",
                )],
            },
        ]
    }

    #[test]
    fn marks_repositories_and_commits() {
        let ctx = DiffAggregator::new(100_000).aggregate(&sample());
        assert!(ctx.text.starts_with("=== REPOSITORY: api ==="));
        assert!(ctx.text.contains("=== REPOSITORY: web ==="));
        assert!(ctx.text.contains("--- COMMIT a1 | Jane <jane@corp.com>"));
        assert!(ctx.text.contains("Message: commit w1"));
        assert_eq!(ctx.included_commits, 3);
        assert_eq!(ctx.evicted_commits, 0);
        assert!(!ctx.truncated);
    }

    #[test]
    fn preserves_commit_order_within_repository() {
        let ctx = DiffAggregator::new(100_000).aggregate(&sample());
        let a1 = ctx.text.find("COMMIT a1").unwrap();
        let a2 = ctx.text.find("COMMIT a2").unwrap();
        assert!(a1 < a2);
    }

    #[test]
    fn evicts_oldest_first() {
        let full = DiffAggregator::new(100_000).aggregate(&sample());
        // Just under the full size: dropping the oldest commit (a1) suffices.
        let ctx = DiffAggregator::new(full.char_len() - 1).aggregate(&sample());
        assert_eq!(ctx.evicted_commits, 1);
        assert!(!ctx.text.contains("COMMIT a1"));
        assert!(ctx.text.contains("COMMIT w1"));
        assert!(ctx.text.contains("COMMIT a2"));
        assert!(ctx.char_len() <= full.char_len() - 1);
    }

    #[test]
    fn drops_header_of_emptied_repository() {
        let repos = vec![
            RepoCommits {
                repo: "old".to_string(),
                commits: vec![commit("old", "o1", "2023-01-01T00:00:00Z", "+x\n")],
            },
            RepoCommits {
                repo: "new".to_string(),
                commits: vec![commit("new", "n1", "2024-01-01T00:00:00Z", "+y\n")],
            },
        ];
        let full = DiffAggregator::new(100_000).aggregate(&repos);
        let ctx = DiffAggregator::new(full.char_len() - 1).aggregate(&repos);
        assert!(!ctx.text.contains("REPOSITORY: old"));
        assert!(ctx.text.starts_with("=== REPOSITORY: new ==="));
    }

    #[test]
    fn truncates_single_oversized_commit() {
        let big = format!("diff --git a/big b/big\n{}", "+line\n".repeat(500));
        let repos = vec![RepoCommits {
            repo: "big".to_string(),
            commits: vec![commit("big", "b1", "2024-02-01T00:00:00Z", &big)],
        }];
        let ctx = DiffAggregator::new(400).aggregate(&repos);
        assert!(ctx.truncated);
        assert_eq!(ctx.included_commits, 1);
        assert!(ctx.text.ends_with(TRUNCATION_MARKER));
        assert!(ctx.char_len() <= 400);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let wide = format!("diff --git a/u b/u\n{}", "+é漢\n".repeat(200));
        let repos = vec![RepoCommits {
            repo: "u".to_string(),
            commits: vec![commit("u", "u1", "2024-02-01T00:00:00Z", &wide)],
        }];
        let ctx = DiffAggregator::new(300).aggregate(&repos);
        assert!(ctx.truncated);
        assert!(ctx.char_len() <= 300);
    }

    #[test]
    fn budget_below_header_size_is_still_honoured() {
        let name = "a-repository-with-a-long-name";
        let repos = vec![RepoCommits {
            repo: name.to_string(),
            commits: vec![commit(name, "l1", "2024-02-01T00:00:00Z", "+x\n")],
        }];
        let ctx = DiffAggregator::new(20).aggregate(&repos);
        assert!(ctx.truncated);
        assert_eq!(ctx.included_commits, 1);
        assert!(ctx.char_len() <= 20);
    }

    #[test]
    fn fully_excluded_commit_gets_placeholder() {
        let mut c = commit("api", "e1", "2024-02-01T00:00:00Z", "");
        c.diff.excluded_paths = vec!["package-lock.json".to_string()];
        let repos = vec![RepoCommits {
            repo: "api".to_string(),
            commits: vec![c],
        }];
        let ctx = DiffAggregator::new(10_000).aggregate(&repos);
        assert!(ctx.text.contains(ALL_EXCLUDED));
        assert!(ctx.text.contains("Excluded files: package-lock.json"));
    }

    #[test]
    fn empty_input_gives_empty_context() {
        let ctx = DiffAggregator::new(1_000).aggregate(&[]);
        assert!(ctx.text.is_empty());
        assert_eq!(ctx.included_commits, 0);
    }
}
