//! # commit-report
//!
//! Mines a developer's git history across local repositories, strips noisy
//! diff sections, asks a generative model for a per-project summary and
//! appends the result to a CSV report.
//!
//! ## Pipeline
//!
//! Miner → Filter → Aggregator → Summarizer → Writer, run once per
//! invocation:
//!
//! - [`git::miner`] runs `git log -p` per repository for the author aliases
//!   and date range.
//! - [`git::exclusion`] drops lockfiles, minified assets and build output.
//! - [`aggregate`] joins everything into one bounded, attributed context.
//! - [`summarizer`] sends that context to the configured model.
//! - [`report`] appends one CSV row per inferred project.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod data;
pub mod git;
pub mod pipeline;
pub mod report;
pub mod summarizer;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of commit-report.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
