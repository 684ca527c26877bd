//! The report run: mine, filter, aggregate, summarize, write.
//!
//! Stages run strictly in sequence. Repository-scoped mining failures are
//! skipped; every other failure aborts the run before the report is touched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::aggregate::{AggregatedContext, DiffAggregator, FilteredCommit, RepoCommits};
use crate::data::{AuthorAliases, DateRange};
use crate::git::{mine_repository, CommitRecord, ExclusionFilter, RepoTarget};
use crate::report::{ReportRow, ReportWriter};
use crate::summarizer::SummaryClient;

/// Everything one run needs, validated.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Developer display name, written to the `Name` column.
    pub developer: String,
    /// Author identities to mine for.
    pub aliases: AuthorAliases,
    /// Repositories, mined in this order.
    pub repos: Vec<RepoTarget>,
    /// Inclusive date range.
    pub range: DateRange,
    /// CSV report path.
    pub output: PathBuf,
    /// Noise filter applied to every diff.
    pub exclusion: ExclusionFilter,
    /// Explicit context budget; derived from the model when absent.
    pub max_context_chars: Option<usize>,
    /// Where to also write the aggregated context.
    pub dump_context: Option<PathBuf>,
    /// Stop after aggregation.
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Repositories that yielded commits.
    pub repos_mined: Vec<String>,
    /// Skipped repositories with the reason.
    pub repos_skipped: Vec<String>,
    /// Commits mined across all repositories.
    pub commits_mined: usize,
    /// Context sent (or, on a dry run, that would have been sent).
    pub context: AggregatedContext,
    /// Projects named by the model.
    pub projects: Vec<String>,
    /// Rows appended to the report.
    pub rows_written: usize,
}

/// Runs one report request against a summary client.
pub struct ReportPipeline {
    request: ReportRequest,
    client: SummaryClient,
}

impl ReportPipeline {
    /// Creates a pipeline.
    pub fn new(request: ReportRequest, client: SummaryClient) -> Self {
        Self { request, client }
    }

    /// Executes every stage.
    pub async fn run(&self) -> Result<RunSummary> {
        let req = &self.request;
        let period = req
            .range
            .month_label()
            .unwrap_or_else(|| req.range.to_string());
        eprintln!(
            "🔍 Mining {} repositories for {} ({period})...",
            req.repos.len(),
            req.developer,
        );

        let (mined, skipped) = mine_all(&req.repos, &req.aliases, &req.range)?;
        let mut summary = self.process_mined(mined).await?;
        summary.repos_skipped = skipped;
        Ok(summary)
    }

    /// Everything after mining: filter, aggregate, summarize, write.
    pub(crate) async fn process_mined(
        &self,
        mined: Vec<(String, Vec<CommitRecord>)>,
    ) -> Result<RunSummary> {
        let req = &self.request;

        let repos_mined: Vec<String> = mined.iter().map(|(name, _)| name.clone()).collect();
        let commits_mined = mined.iter().map(|(_, commits)| commits.len()).sum();
        let repos = filter_commits(mined, &req.exclusion);

        let budget = req
            .max_context_chars
            .unwrap_or_else(|| self.client.context_char_budget(&req.developer, &req.range));
        let context = DiffAggregator::new(budget).aggregate(&repos);

        eprintln!(
            "📊 {} commits from {} repositories, {} chars of context ({} evicted{})",
            context.included_commits,
            repos_mined.len(),
            context.char_len(),
            context.evicted_commits,
            if context.truncated { ", truncated" } else { "" }
        );

        if let Some(path) = &req.dump_context {
            write_context_dump(path, &context.text)?;
            eprintln!("📝 Context written to {}", path.display());
        }

        let mut summary = RunSummary {
            repos_mined,
            commits_mined,
            context,
            ..RunSummary::default()
        };

        if req.dry_run {
            info!("Dry run, skipping AI request and report write");
            return Ok(summary);
        }

        let metadata = self.client.metadata();
        eprintln!(
            "🤖 Summarizing with {} ({})...",
            metadata.provider, metadata.model
        );
        let summaries = self
            .client
            .summarize(&summary.context.text, &req.developer, &req.range)
            .await
            .context("AI summarization failed")?;

        let date_range = req.range.to_string();
        let rows: Vec<ReportRow> = summaries
            .into_iter()
            .map(|s| ReportRow {
                developer: req.developer.clone(),
                date_range: date_range.clone(),
                project: s.project_name,
                summary: s.summary,
                next_steps: s.next_steps,
            })
            .collect();

        ReportWriter::new(&req.output)
            .append(&rows)
            .context("Report writing failed")?;

        summary.projects = rows.iter().map(|r| r.project.clone()).collect();
        summary.rows_written = rows.len();
        info!(
            rows = summary.rows_written,
            path = %req.output.display(),
            "Report updated"
        );
        Ok(summary)
    }
}

/// Mines every repository, skipping those with repository-scoped errors.
///
/// Returns the mined commits per repository and one reason line per skipped
/// repository. Fails when git cannot run or when no repository yields
/// commits.
pub fn mine_all(
    repos: &[RepoTarget],
    aliases: &AuthorAliases,
    range: &DateRange,
) -> Result<(Vec<(String, Vec<CommitRecord>)>, Vec<String>)> {
    let mut mined = Vec::new();
    let mut skipped = Vec::new();

    for target in repos {
        match mine_repository(target, aliases, range) {
            Ok(commits) => {
                eprintln!("  ✓ {}: {} commits", target.name(), commits.len());
                mined.push((target.name().to_string(), commits));
            }
            Err(e) if e.is_repo_scoped() => {
                warn!(repo = %target.name(), error = %e, "Skipping repository");
                eprintln!("  ⚠ Skipping {}: {e}", target.name());
                skipped.push(format!("{}: {e}", target.path().display()));
            }
            Err(e) => return Err(e).context("Commit mining failed"),
        }
    }

    if mined.is_empty() {
        let aliases: Vec<&str> = aliases.iter().collect();
        bail!(
            "No commits by {} between {} in any repository:\n  - {}",
            aliases.join(", "),
            range,
            skipped.join("\n  - ")
        );
    }

    Ok((mined, skipped))
}

/// Applies the exclusion filter to every commit's diff.
pub fn filter_commits(
    mined: Vec<(String, Vec<CommitRecord>)>,
    exclusion: &ExclusionFilter,
) -> Vec<RepoCommits> {
    mined
        .into_iter()
        .map(|(repo, records)| RepoCommits {
            repo,
            commits: records
                .into_iter()
                .map(|record| FilteredCommit {
                    diff: exclusion.filter_diff(&record.diff),
                    record,
                })
                .collect(),
        })
        .collect()
}

fn write_context_dump(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text)
        .with_context(|| format!("Failed to write context dump to {}", path.display()))
}
