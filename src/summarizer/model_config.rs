//! Model limits loaded from the embedded `models.yaml`.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw text of the embedded model configuration.
pub const MODELS_YAML: &str = include_str!("../templates/models.yaml");

/// Fallbacks when neither the model nor the provider is known.
const FALLBACK_MAX_OUTPUT_TOKENS: usize = 4096;
const FALLBACK_INPUT_CONTEXT: usize = 32_768;

/// Model specification from YAML configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelSpec {
    /// Provider key (e.g. "gemini").
    pub provider: String,
    /// Human-readable model name.
    pub model: String,
    /// Identifier sent to the API.
    pub api_identifier: String,
    /// Maximum tokens in one response.
    pub max_output_tokens: usize,
    /// Maximum tokens of input context.
    pub input_context: usize,
}

/// Limits applied to unknown models of a provider.
#[derive(Debug, Deserialize)]
pub struct DefaultConfig {
    /// Default maximum output tokens.
    pub max_output_tokens: usize,
    /// Default input context.
    pub input_context: usize,
}

/// Provider-specific configuration.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for API requests.
    pub api_base: String,
    /// Model used when none is configured.
    pub default_model: String,
    /// Limits for unknown models.
    pub defaults: DefaultConfig,
}

/// Complete model configuration.
#[derive(Debug, Deserialize)]
pub struct ModelConfiguration {
    /// Known models.
    pub models: Vec<ModelSpec>,
    /// Provider configurations keyed by provider key.
    pub providers: HashMap<String, ProviderConfig>,
}

/// Lookup over the model configuration.
pub struct ModelRegistry {
    config: ModelConfiguration,
    by_identifier: HashMap<String, ModelSpec>,
}

impl ModelRegistry {
    /// Parses the embedded YAML.
    pub fn load() -> Result<Self> {
        Self::from_yaml(MODELS_YAML)
    }

    /// Parses a configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ModelConfiguration =
            serde_yaml::from_str(yaml).context("Failed to parse model configuration")?;

        let by_identifier = config
            .models
            .iter()
            .map(|m| (m.api_identifier.clone(), m.clone()))
            .collect();

        Ok(Self {
            config,
            by_identifier,
        })
    }

    /// Returns the spec for an exact API identifier.
    ///
    /// Dated or suffixed identifiers (`gemini-2.5-flash-001`,
    /// `gpt-4o-2024-08-06`) resolve to the longest known prefix.
    pub fn get_model_spec(&self, api_identifier: &str) -> Option<&ModelSpec> {
        if let Some(spec) = self.by_identifier.get(api_identifier) {
            return Some(spec);
        }
        self.by_identifier
            .iter()
            .filter(|(id, _)| {
                api_identifier.starts_with(id.as_str())
                    && api_identifier[id.len()..].starts_with('-')
            })
            .max_by_key(|(id, _)| id.len())
            .map(|(_, spec)| spec)
    }

    /// Max output tokens for `model` requested through `provider`.
    pub fn get_max_output_tokens(&self, provider: &str, model: &str) -> usize {
        if let Some(spec) = self.get_model_spec(model) {
            return spec.max_output_tokens;
        }
        self.config
            .providers
            .get(provider)
            .map_or(FALLBACK_MAX_OUTPUT_TOKENS, |p| p.defaults.max_output_tokens)
    }

    /// Input context for `model` requested through `provider`.
    pub fn get_input_context(&self, provider: &str, model: &str) -> usize {
        if let Some(spec) = self.get_model_spec(model) {
            return spec.input_context;
        }
        self.config
            .providers
            .get(provider)
            .map_or(FALLBACK_INPUT_CONTEXT, |p| p.defaults.input_context)
    }

    /// Provider configuration by key.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.config.providers.get(provider)
    }

    /// Public API endpoint for a provider.
    pub fn api_base(&self, provider: &str) -> Option<&str> {
        self.get_provider_config(provider)
            .map(|p| p.api_base.as_str())
    }

    /// Default model for a provider.
    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.get_provider_config(provider)
            .map(|p| p.default_model.as_str())
    }
}

static MODEL_REGISTRY: OnceLock<ModelRegistry> = OnceLock::new();

/// Returns the global registry built from the embedded YAML.
#[allow(clippy::expect_used)] // embedded document, parsed in tests
pub fn get_model_registry() -> &'static ModelRegistry {
    MODEL_REGISTRY.get_or_init(|| ModelRegistry::load().expect("Failed to load model registry"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn embedded_registry_loads() {
        let registry = ModelRegistry::load().unwrap();
        for provider in ["gemini", "claude", "openai", "ollama"] {
            assert!(
                registry.get_provider_config(provider).is_some(),
                "missing provider {provider}"
            );
            let default = registry.default_model(provider).unwrap();
            assert!(!default.is_empty());
        }
    }

    #[test]
    fn default_models_are_known_for_hosted_providers() {
        let registry = ModelRegistry::load().unwrap();
        for provider in ["gemini", "claude", "openai"] {
            let default = registry.default_model(provider).unwrap();
            assert!(registry.get_model_spec(default).is_some(), "{default}");
        }
    }

    #[test]
    fn exact_lookup() {
        let registry = ModelRegistry::load().unwrap();
        assert_eq!(registry.get_input_context("gemini", "gemini-2.5-pro"), 1_048_576);
        assert_eq!(
            registry.get_max_output_tokens("claude", "claude-sonnet-4-20250514"),
            64_000
        );
    }

    #[test]
    fn suffixed_identifier_uses_longest_prefix() {
        let registry = ModelRegistry::load().unwrap();
        let spec = registry.get_model_spec("gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(spec.api_identifier, "gpt-4o-mini");
        let spec = registry.get_model_spec("gpt-4o-2024-08-06").unwrap();
        assert_eq!(spec.api_identifier, "gpt-4o");
    }

    #[test]
    fn unknown_model_uses_provider_defaults() {
        let registry = ModelRegistry::load().unwrap();
        assert_eq!(registry.get_input_context("ollama", "mistral"), 32_768);
        assert_eq!(registry.get_max_output_tokens("claude", "claude-next"), 4096);
    }

    #[test]
    fn unknown_provider_uses_fallback() {
        let registry = ModelRegistry::load().unwrap();
        assert_eq!(
            registry.get_input_context("nobody", "mystery"),
            FALLBACK_INPUT_CONTEXT
        );
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(ModelRegistry::from_yaml("models: [").is_err());
    }
}
