//! AI summarization of an aggregated work context.

pub mod ai;
pub mod client;
pub mod error;
pub mod model_config;
pub mod prompts;
pub mod response;
#[cfg(test)]
pub(crate) mod test_utils;
pub(crate) mod token_budget;

pub use ai::claude::ClaudeAiClient;
pub use ai::gemini::GeminiAiClient;
pub use ai::openai::OpenAiAiClient;
pub use ai::{AiClient, AiClientMetadata};
pub use client::{create_default_client, SummaryClient};
pub use error::SummarizerError;
pub use response::{parse_summaries, AiSummary};
