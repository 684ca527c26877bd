//! Noise filtering for commit diffs.
//!
//! Lockfiles, minified bundles, media and build output add tokens without
//! telling the model anything about the work done. [`ExclusionFilter`] drops
//! whole file sections whose path matches a configured pattern.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::git::diff_split::split_by_file;

/// Patterns applied unless the user opts out.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "composer.lock",
    "Cargo.lock",
    "*.lock",
    "*.min.js",
    "*.min.css",
    "*.map",
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.svg",
    "*.ico",
    "*.pdf",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "node_modules/",
    "dist/",
    "build/",
    "vendor/",
];

/// Diff text with excluded file sections removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredDiff {
    /// Remaining diff text.
    pub text: String,
    /// Paths whose sections were dropped, in diff order.
    pub excluded_paths: Vec<String>,
}

impl FilteredDiff {
    /// True when nothing but whitespace survived filtering.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Case-insensitive glob matcher over diff file paths.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl ExclusionFilter {
    /// Compiles the given patterns.
    ///
    /// Accepted forms:
    /// - `package-lock.json`: that name as a file or directory at any depth
    /// - `.png`: shorthand for `*.png`
    /// - `dist/` or `dist/*`: everything under any `dist` directory
    /// - anything else is a glob matched against the path and its suffixes
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            for glob in expand_pattern(pattern) {
                let compiled = GlobBuilder::new(&glob)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("Invalid exclusion pattern: {pattern}"))?;
                builder.add(compiled);
            }
            kept.push(pattern.to_string());
        }

        let globs = builder
            .build()
            .context("Failed to compile exclusion patterns")?;

        Ok(Self {
            patterns: kept,
            globs,
        })
    }

    /// Builds a filter from [`DEFAULT_EXCLUDE_PATTERNS`] plus `extra`.
    pub fn with_defaults<I, S>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: Vec<String> = extra.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(
            DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .chain(extra),
        )
    }

    /// Patterns as configured.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `path` matches any exclusion pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        self.globs.is_match(normalized.trim_start_matches("./"))
    }

    /// Removes every file section whose old or new path is excluded.
    pub fn filter_diff(&self, diff: &str) -> FilteredDiff {
        let split = split_by_file(diff);
        let mut text = String::with_capacity(diff.len());
        let mut excluded_paths = Vec::new();

        text.push_str(split.preamble);
        for file in split.files {
            if self.is_excluded(&file.new_path) || self.is_excluded(&file.old_path) {
                excluded_paths.push(file.new_path);
            } else {
                text.push_str(file.content);
            }
        }

        FilteredDiff {
            text,
            excluded_paths,
        }
    }
}

/// Translates one user pattern into the globs that implement it.
fn expand_pattern(pattern: &str) -> Vec<String> {
    let p = pattern.replace('\\', "/");
    let p = p.trim_start_matches("./");

    let dir = p
        .strip_suffix("/**")
        .or_else(|| p.strip_suffix("/*"))
        .or_else(|| p.strip_suffix('/'));
    if let Some(dir) = dir {
        return vec![format!("{dir}/**"), format!("**/{dir}/**")];
    }

    let has_wildcard = p.contains(['*', '?', '[', '{']);
    if !has_wildcard && !p.contains('/') && p.len() > 1 && p.starts_with('.') {
        return vec![format!("*{p}")];
    }

    if has_wildcard {
        vec![p.to_string(), format!("**/{p}")]
    } else {
        vec![
            p.to_string(),
            format!("**/{p}"),
            format!("{p}/**"),
            format!("**/{p}/**"),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn file_diff(path: &str) -> String {
        format!(
            "diff --git a/{path} b/{path}\n\
             --- a/{path}\n\
             +++ b/{path}\n\
             @@ -1 +1 @@\n\
             -old\n\
             +new\n"
        )
    }

    fn defaults() -> ExclusionFilter {
        ExclusionFilter::with_defaults(Vec::<String>::new()).unwrap()
    }

    #[test]
    fn exact_names_at_any_depth() {
        let filter = defaults();
        assert!(filter.is_excluded("package-lock.json"));
        assert!(filter.is_excluded("web/package-lock.json"));
        assert!(!filter.is_excluded("package.json"));
    }

    #[test]
    fn extensions_match_case_insensitively() {
        let filter = defaults();
        assert!(filter.is_excluded("assets/Logo.PNG"));
        assert!(filter.is_excluded("static/app.MIN.js"));
        assert!(!filter.is_excluded("src/app.js"));
    }

    #[test]
    fn directory_prefixes() {
        let filter = defaults();
        assert!(filter.is_excluded("dist/bundle.js"));
        assert!(filter.is_excluded("frontend/node_modules/react/index.js"));
        assert!(!filter.is_excluded("src/distance.rs"));
    }

    #[test]
    fn dot_extension_shorthand() {
        let filter = ExclusionFilter::new([".csv"]).unwrap();
        assert!(filter.is_excluded("data/export.csv"));
        assert!(!filter.is_excluded("data/export.json"));
    }

    #[test]
    fn slash_star_means_directory() {
        let filter = ExclusionFilter::new(["build/*"]).unwrap();
        assert!(filter.is_excluded("build/out/main.o"));
        assert!(filter.is_excluded("app/build/index.html"));
        assert!(!filter.is_excluded("src/builder.rs"));
    }

    #[test]
    fn bare_name_matches_directory_component() {
        let filter = ExclusionFilter::new(["generated"]).unwrap();
        assert!(filter.is_excluded("src/generated/schema.rs"));
        assert!(!filter.is_excluded("src/generator.rs"));
    }

    #[test]
    fn empty_patterns_ignored() {
        let filter = ExclusionFilter::new(["", "  ", "*.lock"]).unwrap();
        assert_eq!(filter.patterns(), &["*.lock".to_string()]);
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = ExclusionFilter::new(["src/[abc"]).unwrap_err();
        assert!(err.to_string().contains("src/[abc"));
    }

    #[test]
    fn filter_drops_excluded_sections() {
        let diff = format!(
            "{}{}{}",
            file_diff("src/main.rs"),
            file_diff("package-lock.json"),
            file_diff("public/logo.svg")
        );
        let filtered = defaults().filter_diff(&diff);
        assert!(filtered.text.contains("src/main.rs"));
        assert!(!filtered.text.contains("package-lock.json"));
        assert!(!filtered.text.contains("logo.svg"));
        assert_eq!(
            filtered.excluded_paths,
            vec!["package-lock.json".to_string(), "public/logo.svg".to_string()]
        );
    }

    #[test]
    fn filter_can_empty_a_commit() {
        let diff = file_diff("yarn.lock");
        let filtered = defaults().filter_diff(&diff);
        assert!(filtered.is_empty());
        assert_eq!(filtered.excluded_paths.len(), 1);
    }

    #[test]
    fn rename_into_excluded_dir_is_dropped() {
        let diff = "diff --git a/src/app.js b/dist/app.js\n\
                    similarity index 100%\n\
                    rename from src/app.js\n\
                    rename to dist/app.js\n";
        let filtered = defaults().filter_diff(diff);
        assert!(filtered.is_empty());
    }

    #[test]
    fn quoted_header_is_matched_on_unescaped_path() {
        let diff = format!(
            "{}diff --git \"a/assets/x\\ty.png\" \"b/assets/x\\ty.png\"\n\
             new file mode 100644\n\
             Binary files /dev/null and \"b/assets/x\\ty.png\" differ\n",
            file_diff("src/main.rs")
        );
        let filtered = defaults().filter_diff(&diff);
        assert!(filtered.text.contains("src/main.rs"));
        assert!(!filtered.text.contains("Binary files"));
        assert_eq!(filtered.excluded_paths, vec!["assets/x\ty.png".to_string()]);
    }

    #[test]
    fn no_patterns_keeps_everything() {
        let diff = file_diff("package-lock.json");
        let filtered = ExclusionFilter::new(Vec::<String>::new())
            .unwrap()
            .filter_diff(&diff);
        assert_eq!(filtered.text, diff);
        assert!(filtered.excluded_paths.is_empty());
    }
}
