//! Google Gemini (Generative Language API) client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata};
use crate::summarizer::error::SummarizerError;

/// Default endpoint of the Generative Language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Provider key used for registry lookups.
const PROVIDER_KEY: &str = "gemini";

/// Low temperature keeps the JSON shape stable between runs.
const TEMPERATURE: f32 = 0.2;

#[derive(Serialize, Debug)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    temperature: f32,
    max_output_tokens: usize,
}

/// Gemini `generateContent` request body.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

/// Gemini `generateContent` response body.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

/// Gemini API client.
pub struct GeminiAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAiClient {
    /// Creates a client against `base_url` (or the public endpoint).
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client()?,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| GEMINI_API_BASE.to_string()),
        })
    }

    fn get_api_url(&self) -> String {
        let url = super::join_url(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        );
        debug!(base_url = %self.base_url, full_url = %url, "Constructed Gemini API URL");
        url
    }

    fn get_max_tokens(&self) -> usize {
        super::registry_model_limits(PROVIDER_KEY, &self.model).1
    }
}

impl AiClient for GeminiAiClient {
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
                "Preparing Gemini API request"
            );

            let system_instruction = (!system_prompt.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            });

            let request = GenerateContentRequest {
                system_instruction,
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part {
                        text: user_prompt.to_string(),
                    }],
                }],
                generation_config: GenerationConfig {
                    response_mime_type: "application/json".to_string(),
                    temperature: TEMPERATURE,
                    max_output_tokens: self.get_max_tokens(),
                },
            };

            let api_url = self.get_api_url();
            info!(url = %api_url, model = %self.model, "Sending request to Gemini API");

            let response = self
                .client
                .post(&api_url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| super::network_error(&e))?;

            let response = super::check_error_response(response).await?;

            let gemini_response: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| SummarizerError::AiRequestFailed(format!("unreadable response body: {e}")))?;

            debug!(
                candidate_count = gemini_response.candidates.len(),
                usage = ?gemini_response.usage_metadata,
                "Received Gemini API response"
            );

            let result = extract_text(&gemini_response);
            super::log_response_success("Gemini", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        let (max_context_length, max_response_length) =
            super::registry_model_limits(PROVIDER_KEY, &self.model);
        AiClientMetadata {
            provider: "Gemini".to_string(),
            model: self.model.clone(),
            max_context_length,
            max_response_length,
        }
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: &GenerateContentResponse) -> Result<String> {
    let candidate = response.candidates.first().ok_or_else(|| {
        SummarizerError::AiRequestFailed("Gemini returned no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(SummarizerError::AiRequestFailed(format!(
            "Gemini returned an empty candidate (finish reason: {reason})"
        ))
        .into());
    }

    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_includes_model() {
        let client = GeminiAiClient::new(
            "gemini-2.5-flash".to_string(),
            "key".to_string(),
            Some("http://localhost:8080/".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.get_api_url(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn default_base_url() {
        let client =
            GeminiAiClient::new("gemini-2.5-flash".to_string(), "key".to_string(), None).unwrap();
        assert_eq!(client.base_url, GEMINI_API_BASE);
        assert_eq!(client.get_metadata().provider, "Gemini");
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "sys".to_string(),
                }],
            }),
            contents: vec![],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.2,
                max_output_tokens: 100,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
    }

    #[test]
    fn extract_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn extract_reports_blocked_candidate() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = extract_text(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn extract_reports_missing_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_text(&response).is_err());
    }
}
