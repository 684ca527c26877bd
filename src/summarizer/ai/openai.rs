//! OpenAI-compatible API client implementation (works with OpenAI, Ollama, etc.)

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata};
use crate::summarizer::error::SummarizerError;

/// Default endpoint of the OpenAI API.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Default endpoint of a local Ollama server.
pub const OLLAMA_API_BASE: &str = "http://localhost:11434";

/// OpenAI API request message
#[derive(Serialize, Debug)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API request body
#[derive(Serialize, Debug)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
    stream: bool,
}

/// OpenAI API response choice
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

/// OpenAI API response message
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API usage statistics
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// OpenAI API response
#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// OpenAI-compatible API client (works with OpenAI, Ollama, etc.)
pub struct OpenAiAiClient {
    client: Client,
    /// Optional for Ollama.
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: Option<f32>,
}

impl OpenAiAiClient {
    /// Creates a new OpenAI-compatible API client.
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: String,
        temperature: Option<f32>,
    ) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client()?,
            api_key,
            model,
            base_url,
            temperature,
        })
    }

    /// Creates a client for a local Ollama server.
    pub fn new_ollama(model: String, base_url: Option<String>) -> Result<Self> {
        Self::new(
            model,
            None,
            base_url.unwrap_or_else(|| OLLAMA_API_BASE.to_string()),
            Some(0.1),
        )
    }

    /// Creates a client for the OpenAI API.
    pub fn new_openai(model: String, api_key: String, base_url: Option<String>) -> Result<Self> {
        Self::new(
            model,
            Some(api_key),
            base_url.unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            Some(0.1),
        )
    }

    fn get_api_url(&self) -> String {
        let url = super::join_url(&self.base_url, "v1/chat/completions");
        debug!(base_url = %self.base_url, full_url = %url, "Constructed OpenAI-compatible API URL");
        url
    }

    /// Ollama is assumed for keyless or local endpoints.
    fn is_ollama(&self) -> bool {
        self.base_url.contains("localhost")
            || self.base_url.contains("127.0.0.1")
            || self.api_key.is_none()
    }

    /// Reasoning models take `max_completion_tokens` and only the default
    /// temperature.
    fn is_reasoning_series(&self) -> bool {
        ["gpt-5", "o1", "o3", "o4"]
            .iter()
            .any(|prefix| self.model.starts_with(prefix))
    }

    fn provider_key(&self) -> &'static str {
        if self.is_ollama() {
            "ollama"
        } else {
            "openai"
        }
    }
}

impl AiClient for OpenAiAiClient {
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
                base_url = %self.base_url,
                is_ollama = self.is_ollama(),
                "Preparing OpenAI-compatible API request"
            );

            let mut messages = Vec::new();
            if !system_prompt.is_empty() {
                messages.push(Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                });
            }
            messages.push(Message {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            });

            let max_tokens = super::registry_model_limits(self.provider_key(), &self.model).1;
            let reasoning = self.is_reasoning_series();
            let request = OpenAiRequest {
                model: self.model.clone(),
                messages,
                max_tokens: (!reasoning).then_some(max_tokens),
                max_completion_tokens: reasoning.then_some(max_tokens),
                temperature: if reasoning { None } else { self.temperature },
                response_format: ResponseFormat {
                    format_type: "json_object".to_string(),
                },
                stream: false,
            };

            let api_url = self.get_api_url();
            info!(url = %api_url, model = %self.model, "Sending request to OpenAI-compatible API");

            let mut req_builder = self
                .client
                .post(&api_url)
                .header("Content-Type", "application/json")
                .json(&request);

            if let Some(ref api_key) = self.api_key {
                req_builder = req_builder.header("Authorization", format!("Bearer {api_key}"));
            }

            let response = req_builder
                .send()
                .await
                .map_err(|e| super::network_error(&e))?;

            let response = super::check_error_response(response).await?;

            let openai_response: OpenAiResponse = response.json().await.map_err(|e| {
                SummarizerError::AiRequestFailed(format!("unreadable response body: {e}"))
            })?;

            debug!(
                choice_count = openai_response.choices.len(),
                model = ?openai_response.model,
                usage = ?openai_response.usage,
                "Received OpenAI-compatible API response"
            );

            let result = openai_response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| {
                    SummarizerError::AiRequestFailed("No choices in response".to_string()).into()
                });

            super::log_response_success("OpenAI-compatible", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        let (max_context_length, max_response_length) =
            super::registry_model_limits(self.provider_key(), &self.model);

        let provider = if self.is_ollama() { "Ollama" } else { "OpenAI" };

        AiClientMetadata {
            provider: provider.to_string(),
            model: self.model.clone(),
            max_context_length,
            max_response_length,
        }
    }
}
