//! Token estimation and budget validation for AI requests.
//!
//! A character heuristic stands in for the provider tokenizers. It sizes the
//! aggregated diff context before mining output is joined, and checks the
//! final prompt before the request goes out.

use anyhow::Result;

use crate::summarizer::ai::AiClientMetadata;
use crate::summarizer::error::SummarizerError;

/// Approximate characters per token for mixed English text and code.
const CHARS_PER_TOKEN: f64 = 3.5;

/// Multiplier covering tokenizer variance (whitespace, non-ASCII, special
/// tokens).
const SAFETY_MARGIN: f64 = 1.10;

/// Estimates the token count for a text string.
#[must_use]
pub(crate) fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_from_char_count(text.chars().count())
}

/// Same heuristic as [`estimate_tokens`] from a pre-computed length.
#[must_use]
pub(crate) fn estimate_tokens_from_char_count(char_count: usize) -> usize {
    let raw_estimate = char_count as f64 / CHARS_PER_TOKEN;
    (raw_estimate * SAFETY_MARGIN).ceil() as usize
}

/// Inverse of [`estimate_tokens_from_char_count`]: characters that fit
/// in `tokens`.
#[must_use]
pub(crate) fn chars_for_tokens(tokens: usize) -> usize {
    (tokens as f64 * CHARS_PER_TOKEN / SAFETY_MARGIN).floor() as usize
}

/// Result of a token budget validation.
#[derive(Debug, Clone)]
pub(crate) struct TokenEstimate {
    /// Estimated prompt tokens (system + user).
    pub estimated_tokens: usize,
    /// Maximum available input tokens for this model.
    pub available_tokens: usize,
    /// Utilization percentage (0.0 to 100.0+).
    pub utilization_pct: f64,
}

/// Input budget derived from model metadata.
#[derive(Debug, Clone)]
pub(crate) struct TokenBudget {
    model: String,
    max_context_length: usize,
    reserved_output_tokens: usize,
}

impl TokenBudget {
    /// Creates a token budget from AI client metadata.
    #[must_use]
    pub fn from_metadata(metadata: &AiClientMetadata) -> Self {
        Self {
            model: metadata.model.clone(),
            max_context_length: metadata.max_context_length,
            reserved_output_tokens: metadata.max_response_length,
        }
    }

    /// Input tokens left after reserving the response.
    #[must_use]
    pub fn available_input_tokens(&self) -> usize {
        self.max_context_length
            .saturating_sub(self.reserved_output_tokens)
    }

    /// Characters of diff context that fit alongside `overhead_chars` of
    /// fixed prompt text.
    #[must_use]
    pub fn context_char_budget(&self, overhead_chars: usize) -> usize {
        chars_for_tokens(self.available_input_tokens()).saturating_sub(overhead_chars)
    }

    /// Checks that the combined prompt fits the input budget.
    pub fn validate_prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<TokenEstimate> {
        let estimated_tokens = estimate_tokens(system_prompt) + estimate_tokens(user_prompt);
        let available = self.available_input_tokens();
        let utilization_pct = if available > 0 {
            (estimated_tokens as f64 / available as f64) * 100.0
        } else {
            f64::INFINITY
        };

        if estimated_tokens > available {
            return Err(SummarizerError::PromptTooLarge {
                estimated_tokens,
                max_tokens: available,
                model: self.model.clone(),
            }
            .into());
        }

        Ok(TokenEstimate {
            estimated_tokens,
            available_tokens: available,
            utilization_pct,
        })
    }
}
