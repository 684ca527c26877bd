//! Author identities for one developer.

use super::ConfigError;

/// The set of author strings (names, emails, usernames) one developer
/// commits under.
///
/// Matching is a case-insensitive substring test against the commit
/// author's name and email, the same semantics `git log --author` gets with
/// `--regexp-ignore-case --fixed-strings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorAliases {
    aliases: Vec<String>,
    lowered: Vec<String>,
}

impl AuthorAliases {
    /// Builds the alias set, trimming entries and dropping blanks and
    /// case-insensitive duplicates.
    pub fn new<I, S>(aliases: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = Vec::new();
        let mut lowered: Vec<String> = Vec::new();
        for alias in aliases {
            let alias = alias.as_ref().trim();
            if alias.is_empty() {
                continue;
            }
            let lower = alias.to_lowercase();
            if lowered.contains(&lower) {
                continue;
            }
            kept.push(alias.to_string());
            lowered.push(lower);
        }

        if kept.is_empty() {
            return Err(ConfigError::NoAliases);
        }

        Ok(Self {
            aliases: kept,
            lowered,
        })
    }

    /// Parses a comma-separated alias list such as `"jane, jane@corp.com"`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(','))
    }

    /// Returns true if any alias occurs in the author name or email.
    pub fn matches(&self, name: &str, email: &str) -> bool {
        let name = name.to_lowercase();
        let email = email.to_lowercase();
        self.lowered
            .iter()
            .any(|alias| name.contains(alias.as_str()) || email.contains(alias.as_str()))
    }

    /// Aliases as given (trimmed), in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    /// Number of distinct aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Always false; construction rejects an empty set.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
