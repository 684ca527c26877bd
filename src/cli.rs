//! CLI interface for commit-report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser};

use crate::data::{AuthorAliases, ConfigError, DateRange};
use crate::git::{ExclusionFilter, RepoTarget};
use crate::pipeline::{ReportPipeline, ReportRequest};
use crate::summarizer::create_default_client;
use crate::utils::preflight::{check_ai_credentials, check_git_available, AiProvider};

/// commit-report: summarise a developer's git work into a CSV report.
#[derive(Parser, Debug)]
#[command(name = "commit-report")]
#[command(
    about = "Summarise a developer's commits across repositories into a CSV report",
    long_about = None
)]
#[command(version)]
#[command(group(ArgGroup::new("range").required(true).args(["last_month", "dates"])))]
pub struct Cli {
    /// Developer name written to the report.
    #[arg(long)]
    pub name: String,

    /// Comma-separated author names or emails the developer commits under.
    #[arg(long, value_name = "A,B,...")]
    pub aliases: String,

    /// Local repository paths to mine.
    #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
    pub repos: Vec<PathBuf>,

    /// Reports on the previous full calendar month.
    #[arg(long)]
    pub last_month: bool,

    /// Reports on an explicit inclusive range (YYYY-MM-DD YYYY-MM-DD).
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub dates: Option<Vec<String>>,

    /// CSV report to append to.
    #[arg(long, value_name = "PATH", default_value = "Developer_Report.csv")]
    pub output: PathBuf,

    /// AI provider.
    #[arg(long, value_enum, env = "COMMIT_REPORT_PROVIDER", default_value = "gemini")]
    pub provider: AiProvider,

    /// Model to use (if not specified, uses the provider's model variable or default).
    #[arg(long)]
    pub model: Option<String>,

    /// Additional exclusion pattern; may be repeated.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Uses only the --exclude patterns, without the built-in list.
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Caps the aggregated context at N characters instead of the model's limit.
    #[arg(long, value_name = "N")]
    pub max_context_chars: Option<usize>,

    /// Also writes the aggregated context to PATH.
    #[arg(long, value_name = "PATH")]
    pub dump_context: Option<PathBuf>,

    /// Mines and aggregates only; no AI request, no report write.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Executes the report run.
    pub async fn execute(self) -> Result<()> {
        let request = self.to_request(Local::now().date_naive())?;

        // Preflight: fail on missing git or credentials before any mining.
        check_git_available().context("Preflight failed")?;
        let credentials = check_ai_credentials(self.provider, self.model.as_deref())
            .context("Preflight failed")?;
        eprintln!(
            "✓ {} credentials verified (model: {})",
            credentials.provider, credentials.model
        );

        let client = create_default_client(&credentials)?;
        let dry_run = request.dry_run;
        let output = request.output.clone();

        let summary = ReportPipeline::new(request, client).run().await?;

        if dry_run {
            eprintln!(
                "✓ Dry run complete: {} commits mined, {} in context",
                summary.commits_mined, summary.context.included_commits
            );
        } else {
            eprintln!(
                "✅ Appended {} project(s) to {}: {}",
                summary.rows_written,
                output.display(),
                summary.projects.join(", ")
            );
        }
        Ok(())
    }

    /// Validates the arguments into a run request. `today` anchors
    /// `--last-month`.
    pub fn to_request(&self, today: NaiveDate) -> Result<ReportRequest> {
        let range = self.date_range(today)?;
        let aliases = AuthorAliases::parse(&self.aliases)?;
        let exclusion = self.exclusion_filter()?;

        Ok(ReportRequest {
            developer: self.name.trim().to_string(),
            aliases,
            repos: self.repos.iter().map(RepoTarget::new).collect(),
            range,
            output: self.output.clone(),
            exclusion,
            max_context_chars: self.max_context_chars,
            dump_context: self.dump_context.clone(),
            dry_run: self.dry_run,
        })
    }

    /// Resolves `--dates` or `--last-month`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, ConfigError> {
        match self.dates.as_deref() {
            Some([start, end]) => DateRange::parse(start, end),
            Some(other) => Err(ConfigError::InvalidDate {
                value: other.join(" "),
            }),
            None => Ok(DateRange::last_full_month(today)),
        }
    }

    fn exclusion_filter(&self) -> Result<ExclusionFilter> {
        if self.no_default_excludes {
            ExclusionFilter::new(&self.exclude)
        } else {
            ExclusionFilter::with_defaults(&self.exclude)
        }
    }
}
