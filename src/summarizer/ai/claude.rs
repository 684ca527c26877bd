//! Anthropic Messages API client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata};
use crate::summarizer::error::SummarizerError;

/// Default endpoint of the Anthropic API.
pub const CLAUDE_API_BASE: &str = "https://api.anthropic.com";

const PROVIDER_KEY: &str = "claude";

/// Claude API request message.
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Claude API request body.
#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    system: String,
    messages: Vec<Message>,
}

/// Claude API response content.
#[derive(Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Claude API response.
#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

/// Claude API client implementation.
pub struct ClaudeAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeAiClient {
    /// Creates a new Claude AI client.
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client()?,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| CLAUDE_API_BASE.to_string()),
        })
    }

    fn get_max_tokens(&self) -> usize {
        super::registry_model_limits(PROVIDER_KEY, &self.model).1
    }
}

impl AiClient for ClaudeAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_prompt_len = system_prompt.len(),
                user_prompt_len = user_prompt.len(),
                model = %self.model,
                "Preparing Claude API request"
            );

            let request = ClaudeRequest {
                model: self.model.clone(),
                max_tokens: self.get_max_tokens(),
                system: system_prompt.to_string(),
                messages: vec![Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                }],
            };

            let url = super::join_url(&self.base_url, "v1/messages");
            info!(
                url = %url,
                model = %self.model,
                max_tokens = request.max_tokens,
                "Sending request to Claude API"
            );

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| super::network_error(&e))?;

            let response = super::check_error_response(response).await?;

            let claude_response: ClaudeResponse = response.json().await.map_err(|e| {
                SummarizerError::AiRequestFailed(format!("unreadable response body: {e}"))
            })?;

            debug!(
                content_count = claude_response.content.len(),
                "Received Claude API response"
            );

            let result = claude_response
                .content
                .iter()
                .find(|c| c.content_type == "text")
                .map(|c| c.text.clone())
                .ok_or_else(|| {
                    SummarizerError::AiRequestFailed("No text content in response".to_string())
                        .into()
                });

            super::log_response_success("Claude", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        let (max_context_length, max_response_length) =
            super::registry_model_limits(PROVIDER_KEY, &self.model);
        AiClientMetadata {
            provider: "Anthropic".to_string(),
            model: self.model.clone(),
            max_context_length,
            max_response_length,
        }
    }
}
