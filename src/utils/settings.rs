//! Settings file fallback for environment variables.
//!
//! `$HOME/.commit-report/settings.json` may hold an `env` map; any variable
//! missing from the process environment is looked up there.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loaded from `$HOME/.commit-report/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path. A missing file yields empty
    /// settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(".commit-report").join("settings.json"))
    }

    /// Returns an environment variable, falling back to these settings.
    /// Empty values count as unset.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.env.get(key).filter(|v| !v.is_empty()).cloned())
    }
}

/// Returns an environment variable with fallback to the settings file.
pub fn get_env_var(key: &str) -> Result<String> {
    if let Some(value) = env::var(key).ok().filter(|v| !v.is_empty()) {
        return Ok(value);
    }

    let settings = Settings::load()
        .map_err(|err| anyhow::anyhow!("Environment variable not found: {key}").context(err))?;
    settings
        .get_env_var(key)
        .ok_or_else(|| anyhow::anyhow!("Environment variable not found: {key}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"{"env": {"GEMINI_API_KEY": "from-file", "GEMINI_MODEL": "gemini-2.5-pro"}}"#,
        );

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.env.get("GEMINI_API_KEY").unwrap(), "from-file");
        assert_eq!(settings.env.len(), 2);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(dir.path().join("nope.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, "{ not json");
        let err = Settings::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn environment_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"{"env": {"COMMIT_REPORT_TEST_PRECEDENCE": "file", "COMMIT_REPORT_TEST_FILE_ONLY": "file-only"}}"#,
        );
        let settings = Settings::load_from_path(&path).unwrap();

        env::set_var("COMMIT_REPORT_TEST_PRECEDENCE", "env");
        assert_eq!(
            settings.get_env_var("COMMIT_REPORT_TEST_PRECEDENCE").unwrap(),
            "env"
        );
        env::remove_var("COMMIT_REPORT_TEST_PRECEDENCE");
        assert_eq!(
            settings.get_env_var("COMMIT_REPORT_TEST_PRECEDENCE").unwrap(),
            "file"
        );
        assert_eq!(
            settings.get_env_var("COMMIT_REPORT_TEST_FILE_ONLY").unwrap(),
            "file-only"
        );
    }

    #[test]
    fn empty_values_count_as_unset() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{"env": {"COMMIT_REPORT_TEST_EMPTY": ""}}"#);
        let settings = Settings::load_from_path(&path).unwrap();
        assert!(settings.get_env_var("COMMIT_REPORT_TEST_EMPTY").is_none());
    }
}
