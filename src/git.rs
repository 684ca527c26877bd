//! Git access: repository targets, commit mining and diff filtering.

pub mod diff_split;
pub mod error;
pub mod exclusion;
pub mod miner;
pub mod repository;

pub use error::MinerError;
pub use exclusion::{ExclusionFilter, FilteredDiff, DEFAULT_EXCLUDE_PATTERNS};
pub use miner::{mine_repository, CommitRecord};
pub use repository::RepoTarget;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
