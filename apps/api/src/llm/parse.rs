//! Post-processing of model output into typed values.
//!
//! Models are asked for strict JSON but do not always comply. Parsing
//! degrades through three tiers and never errors: strict parse, then a
//! balanced `{...}` span dug out of surrounding prose, then a caller-supplied
//! default. Callers surface the last tier as a `fallback` flag rather than
//! failing the request.

use serde::de::DeserializeOwned;

/// Which tier produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Parsed,
    Extracted,
    DefaultFallback,
}

/// A typed value plus the tier that produced it.
#[derive(Debug, Clone)]
pub struct StructuredOutput<T> {
    pub value: T,
    pub tier: ParseTier,
}

impl<T> StructuredOutput<T> {
    pub fn is_fallback(&self) -> bool {
        self.tier == ParseTier::DefaultFallback
    }
}

/// Parses model text into `T`, degrading instead of erroring.
pub fn parse_structured<T, F>(raw: &str, fallback: F) -> StructuredOutput<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let cleaned = strip_json_fences(raw);

    if let Ok(value) = serde_json::from_str::<T>(cleaned) {
        return StructuredOutput {
            value,
            tier: ParseTier::Parsed,
        };
    }

    if let Some(span) = extract_json_object(cleaned) {
        if let Ok(value) = serde_json::from_str::<T>(span) {
            return StructuredOutput {
                value,
                tier: ParseTier::Extracted,
            };
        }
    }

    tracing::warn!(
        length = raw.len(),
        "model output unparseable, serving default fallback"
    );
    StructuredOutput {
        value: fallback(),
        tier: ParseTier::DefaultFallback,
    }
}

/// Removes a ```json ... ``` (or bare ```) fence wrapper if present.
pub fn strip_json_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Finds the first balanced `{...}` span, tracking string literals so braces
/// inside quoted values do not confuse the depth count.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Score {
        score: u32,
        verdict: String,
    }

    fn default_score() -> Score {
        Score {
            score: 0,
            verdict: "unknown".to_string(),
        }
    }

    #[test]
    fn test_strict_json_parses_at_top_tier() {
        let out = parse_structured::<Score, _>(
            r#"{"score": 87, "verdict": "strong"}"#,
            default_score,
        );
        assert_eq!(out.tier, ParseTier::Parsed);
        assert_eq!(out.value.score, 87);
        assert!(!out.is_fallback());
    }

    #[test]
    fn test_fenced_json_parses_at_top_tier() {
        let raw = "```json\n{\"score\": 42, \"verdict\": \"ok\"}\n```";
        let out = parse_structured::<Score, _>(raw, default_score);
        assert_eq!(out.tier, ParseTier::Parsed);
        assert_eq!(out.value.score, 42);
    }

    #[test]
    fn test_prose_wrapped_json_extracts() {
        let raw = r#"Here is my assessment: {"score": 63, "verdict": "fair"} Hope that helps!"#;
        let out = parse_structured::<Score, _>(raw, default_score);
        assert_eq!(out.tier, ParseTier::Extracted);
        assert_eq!(out.value.verdict, "fair");
    }

    #[test]
    fn test_braces_inside_strings_do_not_break_extraction() {
        let raw = r#"note: {"score": 5, "verdict": "odd } brace"} trailing"#;
        let out = parse_structured::<Score, _>(raw, default_score);
        assert_eq!(out.tier, ParseTier::Extracted);
        assert_eq!(out.value.verdict, "odd } brace");
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let out = parse_structured::<Score, _>("I cannot answer that.", default_score);
        assert_eq!(out.tier, ParseTier::DefaultFallback);
        assert_eq!(out.value, default_score());
        assert!(out.is_fallback());
    }

    #[test]
    fn test_empty_input_falls_back() {
        let out = parse_structured::<Score, _>("", default_score);
        assert_eq!(out.tier, ParseTier::DefaultFallback);
    }

    #[test]
    fn test_strip_fences_variants() {
        assert_eq!(strip_json_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("  {} "), "{}");
    }
}
