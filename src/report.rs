//! CSV report writer.
//!
//! The report is append-only: each run adds one row per project, and the
//! header is written only when the file is new or empty.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Column header of the report.
pub const REPORT_HEADER: [&str; 5] = ["Name", "Date Range", "Project", "Summary", "Next Steps"];

/// Failure to write the report file.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The file or its parent directory could not be written.
    #[error("Failed to write report {}: {source}", path.display())]
    Write {
        /// Report path.
        path: PathBuf,
        /// Underlying I/O or CSV error.
        #[source]
        source: csv::Error,
    },
}

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Developer name as given on the command line.
    #[serde(rename = "Name")]
    pub developer: String,
    /// Human-readable date range.
    #[serde(rename = "Date Range")]
    pub date_range: String,
    /// Project inferred by the model.
    #[serde(rename = "Project")]
    pub project: String,
    /// Work summary.
    #[serde(rename = "Summary")]
    pub summary: String,
    /// Next steps.
    #[serde(rename = "Next Steps")]
    pub next_steps: String,
}

/// Appends rows to a CSV report file.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Creates a writer for `path`. Nothing is touched until [`append`](Self::append).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the report.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows`, writing the header first if the file is missing or
    /// empty. Parent directories are created as needed.
    pub fn append(&self, rows: &[ReportRow]) -> Result<(), ReportError> {
        self.write_rows(rows).map_err(|source| ReportError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn write_rows(&self, rows: &[ReportRow]) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(REPORT_HEADER)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            header = needs_header,
            "Appended report rows"
        );
        Ok(())
    }
}
