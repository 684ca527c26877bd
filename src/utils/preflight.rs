//! Preflight validation checks for early failure detection.
//!
//! Credentials are resolved before any repository is mined so a missing API
//! key fails the run in milliseconds rather than after a long `git log`.

use std::fmt;
use std::process::Command;

use anyhow::Result;
use clap::ValueEnum;
use tracing::debug;

use crate::git::MinerError;
use crate::summarizer::error::SummarizerError;
use crate::summarizer::model_config::get_model_registry;
use crate::utils::settings::get_env_var;

/// AI provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    /// Google Gemini API
    Gemini,
    /// Anthropic Claude API
    Claude,
    /// OpenAI API
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "Gemini API"),
            Self::Claude => write!(f, "Claude API"),
            Self::OpenAi => write!(f, "OpenAI API"),
            Self::Ollama => write!(f, "Ollama"),
        }
    }
}

impl AiProvider {
    /// Key of the provider in the model registry.
    pub fn key(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Variables checked for the API key, in order. Empty for keyless
    /// providers.
    pub fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::Claude => &["CLAUDE_API_KEY", "ANTHROPIC_API_KEY"],
            Self::OpenAi => &["OPENAI_API_KEY"],
            Self::Ollama => &[],
        }
    }

    /// Variable overriding the default model.
    pub fn model_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_MODEL",
            Self::Claude => "ANTHROPIC_MODEL",
            Self::OpenAi => "OPENAI_MODEL",
            Self::Ollama => "OLLAMA_MODEL",
        }
    }

    /// Variable overriding the API endpoint.
    pub fn base_url_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_BASE_URL",
            Self::Claude => "ANTHROPIC_BASE_URL",
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::Ollama => "OLLAMA_BASE_URL",
        }
    }

    fn fallback_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::Claude => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
            Self::Ollama => "llama3.1",
        }
    }
}

/// Result of AI credential validation.
#[derive(Debug, Clone)]
pub struct AiCredentialInfo {
    /// The AI provider that will be used.
    pub provider: AiProvider,
    /// The model that will be used.
    pub model: String,
    /// API key, absent for keyless providers.
    pub api_key: Option<String>,
    /// Endpoint override.
    pub base_url: Option<String>,
}

/// Resolves provider credentials from the environment and settings file.
///
/// Model precedence: `model_override`, then the provider's model variable,
/// then the registry default. The endpoint comes from the provider's base
/// URL variable, else the registry.
pub fn check_ai_credentials(
    provider: AiProvider,
    model_override: Option<&str>,
) -> Result<AiCredentialInfo, SummarizerError> {
    resolve_credentials(provider, model_override, |key| get_env_var(key).ok())
}

fn resolve_credentials(
    provider: AiProvider,
    model_override: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AiCredentialInfo, SummarizerError> {
    let model = model_override
        .map(String::from)
        .or_else(|| lookup(provider.model_var()))
        .or_else(|| {
            get_model_registry()
                .default_model(provider.key())
                .map(String::from)
        })
        .unwrap_or_else(|| provider.fallback_model().to_string());

    let key_vars = provider.api_key_vars();
    let api_key = key_vars.iter().find_map(|var| lookup(var));
    if !key_vars.is_empty() && api_key.is_none() {
        return Err(SummarizerError::ApiKeyNotFound {
            provider: provider.to_string(),
            variables: key_vars.iter().map(|v| (*v).to_string()).collect(),
        });
    }

    let base_url = lookup(provider.base_url_var()).or_else(|| {
        get_model_registry()
            .api_base(provider.key())
            .map(String::from)
    });

    debug!(
        provider = %provider,
        model = %model,
        base_url = ?base_url,
        "Resolved AI credentials"
    );

    Ok(AiCredentialInfo {
        provider,
        model,
        api_key,
        base_url,
    })
}

/// Validates that the `git` binary can be executed.
pub fn check_git_available() -> Result<(), MinerError> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(MinerError::GitUnavailable)?;
    debug!(
        version = %String::from_utf8_lossy(&output.stdout).trim(),
        "Found git"
    );
    Ok(())
}
