//! Parsing of the model's JSON answer into [`AiSummary`] values.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::summarizer::error::SummarizerError;

/// Matches a fenced code block, with or without a language tag.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)\s*```").unwrap());

/// One project's entry in the model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSummary {
    /// Project the work belongs to.
    pub project_name: String,
    /// Business-oriented summary of the work.
    #[serde(deserialize_with = "text_or_list")]
    pub summary: String,
    /// Inferred next steps.
    #[serde(deserialize_with = "text_or_list")]
    pub next_steps: String,
}

/// Models sometimes answer a prose field with a list of sentences.
fn text_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrList {
        Text(String),
        List(Vec<String>),
    }

    Ok(match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) => text,
        TextOrList::List(items) => items.join(" "),
    })
}

/// Parses a model response into at least one summary.
///
/// Accepted shapes, after stripping any Markdown code fence:
/// - `{"projects": [ {...}, ... ]}`
/// - a bare array of project objects
/// - a single project object
/// - any of the above as a JSON string inside `{"response": "..."}`
pub fn parse_summaries(raw: &str) -> Result<Vec<AiSummary>, SummarizerError> {
    let fail = |reason: String| SummarizerError::AiParseFailed {
        reason,
        raw: raw.to_string(),
    };

    let mut value = parse_json(raw).map_err(|e| fail(format!("invalid JSON: {e}")))?;

    // CLI wrappers put the model text in a "response" field.
    if let Some(inner) = value.get("response").cloned() {
        value = match inner {
            Value::String(text) => {
                parse_json(&text).map_err(|e| fail(format!("invalid JSON in response field: {e}")))?
            }
            other => other,
        };
    }

    let items = match value {
        Value::Object(mut map) if map.contains_key("projects") => {
            match map.remove("projects") {
                Some(Value::Array(items)) => items,
                _ => return Err(fail("\"projects\" is not an array".to_string())),
            }
        }
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Err(fail("expected a JSON object or array".to_string())),
    };

    if items.is_empty() {
        return Err(fail("response lists no projects".to_string()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let summary: AiSummary = serde_json::from_value(item)
                .map_err(|e| fail(format!("project {}: {e}", i + 1)))?;
            if summary.project_name.trim().is_empty() {
                return Err(fail(format!("project {}: empty project_name", i + 1)));
            }
            if summary.summary.trim().is_empty() {
                return Err(fail(format!("project {}: empty summary", i + 1)));
            }
            Ok(AiSummary {
                project_name: summary.project_name.trim().to_string(),
                summary: summary.summary.trim().to_string(),
                next_steps: summary.next_steps.trim().to_string(),
            })
        })
        .collect()
}

/// Parses `text` as JSON, falling back to the first fenced block when the
/// text as a whole is not JSON.
fn parse_json(text: &str) -> serde_json::Result<Value> {
    let direct = serde_json::from_str(text.trim());
    if direct.is_ok() {
        return direct;
    }
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(fenced) => serde_json::from_str(fenced.as_str().trim()),
        None => direct,
    }
}
