//! Summarizer error handling.

use thiserror::Error;

/// Errors from the AI summarization stage. All of them abort the run.
#[derive(Error, Debug)]
pub enum SummarizerError {
    /// No API key configured for the selected provider.
    #[error("{provider} API key not found. Set one of: {}", .variables.join(", "))]
    ApiKeyNotFound {
        /// Provider display name.
        provider: String,
        /// Environment variables that were checked.
        variables: Vec<String>,
    },

    /// The endpoint answered with a non-success status.
    #[error("AI request failed: {0}")]
    AiRequestFailed(String),

    /// The request could not be sent or timed out.
    #[error("AI request failed: network error: {0}")]
    NetworkError(String),

    /// The response did not contain the expected JSON document.
    #[error("Could not parse AI response: {reason}\n--- raw response ---\n{raw}")]
    AiParseFailed {
        /// What was wrong with the response.
        reason: String,
        /// The response text as received.
        raw: String,
    },

    /// The assembled prompt will not fit the model's input context.
    #[error(
        "Prompt too large for {model}: estimated {estimated_tokens} tokens, limit {max_tokens}. \
         Lower --max-context-chars or narrow the date range"
    )]
    PromptTooLarge {
        /// Estimated prompt tokens.
        estimated_tokens: usize,
        /// Available input tokens.
        max_tokens: usize,
        /// Model identifier.
        model: String,
    },
}
