//! Summary client: one prompt in, parsed project summaries out.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::data::DateRange;
use crate::summarizer::ai::claude::ClaudeAiClient;
use crate::summarizer::ai::gemini::GeminiAiClient;
use crate::summarizer::ai::openai::OpenAiAiClient;
use crate::summarizer::ai::{AiClient, AiClientMetadata};
use crate::summarizer::prompts;
use crate::summarizer::response::{parse_summaries, AiSummary};
use crate::summarizer::token_budget::TokenBudget;
use crate::utils::preflight::{AiCredentialInfo, AiProvider};

/// Wraps an [`AiClient`] with the work-summary prompt and response contract.
pub struct SummaryClient {
    ai_client: Box<dyn AiClient>,
}

impl SummaryClient {
    /// Creates a client over any AI backend.
    pub fn new(ai_client: Box<dyn AiClient>) -> Self {
        Self { ai_client }
    }

    /// Returns metadata of the underlying backend.
    pub fn metadata(&self) -> AiClientMetadata {
        self.ai_client.get_metadata()
    }

    /// Characters of aggregated context the model can take for this
    /// developer and range.
    pub fn context_char_budget(&self, developer: &str, range: &DateRange) -> usize {
        TokenBudget::from_metadata(&self.metadata())
            .context_char_budget(prompts::prompt_overhead_chars(developer, range))
    }

    /// Sends one summary request and parses the answer.
    ///
    /// There is no retry: a transport failure or an unparseable answer is
    /// returned as is.
    pub async fn summarize(
        &self,
        context: &str,
        developer: &str,
        range: &DateRange,
    ) -> Result<Vec<AiSummary>> {
        let user_prompt = prompts::generate_user_prompt(developer, range, context);

        let metadata = self.metadata();
        let estimate = TokenBudget::from_metadata(&metadata)
            .validate_prompt(prompts::SYSTEM_PROMPT, &user_prompt)?;
        debug!(
            estimated_tokens = estimate.estimated_tokens,
            available_tokens = estimate.available_tokens,
            utilization_pct = format!("{:.1}", estimate.utilization_pct),
            "Prompt fits model input budget"
        );

        info!(
            provider = %metadata.provider,
            model = %metadata.model,
            context_chars = context.chars().count(),
            "Requesting work summary"
        );

        let raw = self
            .ai_client
            .send_request(prompts::SYSTEM_PROMPT, &user_prompt)
            .await?;

        let summaries = parse_summaries(&raw)?;
        debug!(project_count = summaries.len(), "Parsed work summary");
        Ok(summaries)
    }
}

/// Builds the backend selected by preflight.
pub fn create_default_client(credentials: &AiCredentialInfo) -> Result<SummaryClient> {
    let model = credentials.model.clone();
    let base_url = credentials.base_url.clone();

    let ai_client: Box<dyn AiClient> = match credentials.provider {
        AiProvider::Ollama => Box::new(OpenAiAiClient::new_ollama(model, base_url)?),
        provider => {
            let api_key = credentials
                .api_key
                .clone()
                .with_context(|| format!("No API key resolved for {provider}"))?;
            match provider {
                AiProvider::Gemini => Box::new(GeminiAiClient::new(model, api_key, base_url)?),
                AiProvider::Claude => Box::new(ClaudeAiClient::new(model, api_key, base_url)?),
                AiProvider::OpenAi | AiProvider::Ollama => {
                    Box::new(OpenAiAiClient::new_openai(model, api_key, base_url)?)
                }
            }
        }
    };

    Ok(SummaryClient::new(ai_client))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::summarizer::error::SummarizerError;
    use crate::summarizer::test_utils::ConfigurableMockAiClient;

    const GOOD: &str = r#"{"projects":[{"project_name":"Billing","summary":"Invoices export.","next_steps":"Imports."}]}"#;

    fn range() -> DateRange {
        DateRange::parse("2024-02-01", "2024-02-29").unwrap()
    }

    #[tokio::test]
    async fn summarize_sends_one_request_and_parses() {
        let mock = ConfigurableMockAiClient::new(vec![Ok(GOOD.to_string())]);
        let prompts = mock.prompt_handle();
        let client = SummaryClient::new(Box::new(mock));

        let summaries = client
            .summarize("=== REPOSITORY: billing ===", "Jane", &range())
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].project_name, "Billing");
        assert_eq!(prompts.request_count(), 1);
        let (system, user) = &prompts.prompts()[0];
        assert_eq!(system, prompts::SYSTEM_PROMPT);
        assert!(user.contains("Jane"));
        assert!(user.ends_with("=== REPOSITORY: billing ==="));
    }

    #[tokio::test]
    async fn malformed_response_is_parse_error() {
        let client = SummaryClient::new(Box::new(ConfigurableMockAiClient::new(vec![Ok(
            "not json at all".to_string(),
        )])));
        let err = client.summarize("ctx", "Jane", &range()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SummarizerError>(),
            Some(SummarizerError::AiParseFailed { .. })
        ));
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let mock = ConfigurableMockAiClient::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Ok(GOOD.to_string()),
        ]);
        let remaining = mock.response_handle();
        let client = SummaryClient::new(Box::new(mock));

        assert!(client.summarize("ctx", "Jane", &range()).await.is_err());
        assert_eq!(remaining.remaining(), 1);
    }

    #[tokio::test]
    async fn oversized_prompt_rejected_before_sending() {
        let mock = ConfigurableMockAiClient::new(vec![Ok(GOOD.to_string())])
            .with_context_length(1_000);
        let prompts = mock.prompt_handle();
        let client = SummaryClient::new(Box::new(mock));

        let context = "x".repeat(10_000);
        let err = client.summarize(&context, "Jane", &range()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SummarizerError>(),
            Some(SummarizerError::PromptTooLarge { .. })
        ));
        assert_eq!(prompts.request_count(), 0);
    }

    #[test]
    fn context_budget_leaves_room_for_prompt() {
        let client = SummaryClient::new(Box::new(ConfigurableMockAiClient::new(vec![])));
        let budget = client.context_char_budget("Jane", &range());
        let overhead = prompts::prompt_overhead_chars("Jane", &range());
        let estimate = crate::summarizer::token_budget::estimate_tokens_from_char_count(
            budget + overhead,
        );
        let meta = client.metadata();
        assert!(budget > 0);
        assert!(estimate <= meta.max_context_length - meta.max_response_length + 1);
    }

    #[test]
    fn default_client_for_ollama_needs_no_key() {
        let credentials = AiCredentialInfo {
            provider: AiProvider::Ollama,
            model: "llama3.1".to_string(),
            api_key: None,
            base_url: None,
        };
        let client = create_default_client(&credentials).unwrap();
        assert_eq!(client.metadata().provider, "Ollama");
    }

    #[test]
    fn default_client_without_key_fails() {
        let credentials = AiCredentialInfo {
            provider: AiProvider::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: None,
        };
        assert!(create_default_client(&credentials).is_err());
    }

    #[test]
    fn default_client_for_gemini() {
        let credentials = AiCredentialInfo {
            provider: AiProvider::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_key: Some("key".to_string()),
            base_url: None,
        };
        let client = create_default_client(&credentials).unwrap();
        assert_eq!(client.metadata().provider, "Gemini");
        assert_eq!(client.metadata().model, "gemini-2.5-flash");
    }
}
