//! Prompt templates for the work summary request.

use crate::data::DateRange;

/// System prompt: role and output contract.
pub const SYSTEM_PROMPT: &str = r#"You are a data analysis and JSON extraction assistant. Your only job is to read a developer's git commits and diffs and return a strict JSON document describing the work.

Rules:
- Output valid JSON only. No introduction, no conclusion, no Markdown, no code fences.
- Base every statement on the commits and diffs provided. Do not invent work that is not shown.
- Write for a non-technical stakeholder: describe business value and user-visible outcomes, not function names."#;

/// User prompt template. `{developer}`, `{date_range}` and `{context}` are
/// substituted by [`generate_user_prompt`].
const USER_PROMPT_TEMPLATE: &str = r#"Summarise the work of {developer} between {date_range}.

The input below contains commits grouped by repository. Each repository starts with a line "=== REPOSITORY: <name> ===" and each commit starts with a line "--- COMMIT <hash> | <author> | <date> ---".

Tasks:
1. Identify each distinct project the work belongs to. A repository is usually one project, but one repository may contain several clearly separate projects, and several repositories may belong to one project.
2. For each project write a concise paragraph summarising the work completed, features delivered and bugs fixed, phrased in terms of business value.
3. For each project infer the logical next steps from the state of the code changes, in one or two sentences.

Respond with exactly this JSON shape:
{"projects": [{"project_name": "<name>", "summary": "<paragraph>", "next_steps": "<sentence>"}]}

INPUT DATA TO PROCESS:
{context}"#;

/// Fills the user prompt template.
pub fn generate_user_prompt(developer: &str, range: &DateRange, context: &str) -> String {
    // Context goes in last so braces inside diffs are never re-substituted.
    USER_PROMPT_TEMPLATE
        .replace("{developer}", developer)
        .replace("{date_range}", &range.to_string())
        .replace("{context}", context)
}

/// Characters of fixed prompt text around the context, used to size the
/// context budget.
pub fn prompt_overhead_chars(developer: &str, range: &DateRange) -> usize {
    SYSTEM_PROMPT.chars().count() + generate_user_prompt(developer, range, "").chars().count()
}
