//! Pluggable extraction of role metadata from a raw job description.
//!
//! No single extraction algorithm is assumed correct; implementations are
//! substitutable behind [`MetadataExtractor`]. The default is a keyword
//! scanner that backfills whatever the model leaves blank.

use serde::Serialize;

pub const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMetadata {
    pub company: String,
    pub position: String,
    pub role_level: String,
    pub location: String,
    pub salary_range: String,
}

pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, job_description: &str) -> JobMetadata;
}

/// Line- and keyword-based scanner. Deterministic, no model call.
pub struct KeywordMetadataExtractor;

impl MetadataExtractor for KeywordMetadataExtractor {
    fn extract(&self, job_description: &str) -> JobMetadata {
        JobMetadata {
            company: extract_company(job_description),
            position: extract_position(job_description),
            role_level: extract_role_level(job_description),
            location: extract_location(job_description),
            salary_range: extract_salary(job_description),
        }
    }
}

/// Returns the text after `label` on the first line starting with it,
/// matching the label case-insensitively.
fn labeled_value(text: &str, labels: &[&str]) -> Option<String> {
    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        for label in labels {
            if lower.starts_with(label) {
                let value = trimmed[label.len()..].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn first_nonempty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

fn extract_company(text: &str) -> String {
    if let Some(value) = labeled_value(text, &["company:", "employer:"]) {
        return value;
    }
    // "Senior Engineer at Acme" title pattern
    if let Some(first) = first_nonempty_line(text) {
        if let Some(after) = first.split(" at ").nth(1) {
            let company = after.trim().trim_end_matches(['.', ',']);
            if !company.is_empty() {
                return company.to_string();
            }
        }
    }
    NOT_SPECIFIED.to_string()
}

fn extract_position(text: &str) -> String {
    if let Some(value) = labeled_value(text, &["position:", "job title:", "title:", "role:"]) {
        return value;
    }
    match first_nonempty_line(text) {
        Some(first) => {
            let title = first.split(" at ").next().unwrap_or(first).trim();
            let mut position: String = title.chars().take(80).collect();
            if position.is_empty() {
                position = NOT_SPECIFIED.to_string();
            }
            position
        }
        None => NOT_SPECIFIED.to_string(),
    }
}

/// Whole-token match so "cto" cannot fire inside "director".
fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == word)
}

fn extract_role_level(text: &str) -> String {
    let lower = text.to_lowercase();
    // most senior signal wins
    let levels: [(&[&str], &[&str], &str); 7] = [
        (&["chief", "cto", "ceo", "coo"], &["c-level"], "executive"),
        (&["vp"], &["vice president", "head of"], "vp"),
        (&["director"], &[], "director"),
        (&["principal"], &[], "principal"),
        (&["staff"], &[], "staff"),
        (&["senior", "sr"], &[], "senior"),
        (&["junior", "jr", "intern"], &[], "junior"),
    ];
    for (words, phrases, level) in levels {
        if words.iter().any(|w| contains_word(&lower, w))
            || phrases.iter().any(|p| lower.contains(p))
        {
            return level.to_string();
        }
    }
    "mid".to_string()
}

fn extract_location(text: &str) -> String {
    if let Some(value) = labeled_value(text, &["location:", "based in:"]) {
        return value;
    }
    if text.to_lowercase().contains("remote") {
        return "Remote".to_string();
    }
    NOT_SPECIFIED.to_string()
}

/// Scans for dollar amounts; two of them make a range.
fn extract_salary(text: &str) -> String {
    let mut amounts = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && amounts.len() < 2 {
        if bytes[i] == b'$' {
            let start = i;
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_digit() || matches!(bytes[i], b',' | b'.' | b'k' | b'K'))
            {
                i += 1;
            }
            // '.' and ',' are valid inside an amount but not at its end
            let amount = text[start..i].trim_end_matches(['.', ',']);
            if amount.len() > 1 {
                amounts.push(amount.to_string());
            }
        } else {
            i += 1;
        }
    }
    match amounts.len() {
        2 => format!("{} - {}", amounts[0], amounts[1]),
        1 => amounts[0].clone(),
        _ => NOT_SPECIFIED.to_string(),
    }
}
