//! Run parameters shared by every pipeline stage.

pub mod date_range;
pub mod identity;

use thiserror::Error;

pub use date_range::DateRange;
pub use identity::AuthorAliases;

/// Invalid run configuration, reported before any repository is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A date argument was not in `YYYY-MM-DD` form.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// The range ends before it starts.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedRange {
        /// Requested start date.
        start: String,
        /// Requested end date.
        end: String,
    },

    /// No usable author alias was supplied.
    #[error("No author aliases given. Pass at least one name or email to --aliases")]
    NoAliases,
}
