//! AI client trait and metadata definitions.

pub mod claude;
pub mod gemini;
pub mod openai;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::summarizer::error::SummarizerError;
use crate::summarizer::model_config::get_model_registry;

/// HTTP request timeout for AI API calls.
///
/// Large aggregated contexts can take minutes to process; the timeout only
/// guards against a hung connection.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Maximum context length supported.
    pub max_context_length: usize,
    /// Maximum token response length supported.
    pub max_response_length: usize,
}

// ── Shared helpers for AI client implementations ────────────────────

/// Builds an HTTP client with the standard request timeout.
pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Returns (input context length, max response length) for `model` from the
/// registry, falling back to `provider_key` defaults.
#[must_use]
pub(crate) fn registry_model_limits(provider_key: &str, model: &str) -> (usize, usize) {
    let registry = get_model_registry();
    (
        registry.get_input_context(provider_key, model),
        registry.get_max_output_tokens(provider_key, model),
    )
}

/// Joins a base URL and an endpoint path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Maps a transport error from `reqwest` into the summarizer taxonomy.
pub(crate) fn network_error(err: &reqwest::Error) -> SummarizerError {
    if err.is_timeout() {
        SummarizerError::NetworkError(format!(
            "request timed out after {}s",
            REQUEST_TIMEOUT.as_secs()
        ))
    } else {
        SummarizerError::NetworkError(err.to_string())
    }
}

/// Passes a successful response through; turns any other status into
/// [`SummarizerError::AiRequestFailed`] carrying the body.
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(SummarizerError::AiRequestFailed(format!("HTTP {status}: {error_text}")).into())
}

/// Logs successful text extraction from an AI API response.
pub(crate) fn log_response_success(provider: &str, result: &Result<String>) {
    if let Ok(text) = result {
        tracing::debug!(
            response_len = text.len(),
            "Successfully extracted text content from {} API response",
            provider
        );
        tracing::debug!(
            response_content = %text,
            "{} API response content",
            provider
        );
    }
}

/// Trait for AI service clients.
pub trait AiClient: Send + Sync {
    /// Sends a request to the AI service and returns the raw response text.
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the AI client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}
