//! Prompt fragments shared by every structured-output feature.

/// Appended to system prompts whose responses must be machine-parseable.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object and nothing \
else. No markdown fences, no commentary before or after the JSON.";

/// Builds a system prompt from a task-specific body plus the JSON contract.
pub fn json_system_prompt(body: &str) -> String {
    format!("{body}\n\n{JSON_ONLY_SYSTEM}")
}
