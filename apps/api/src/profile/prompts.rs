//! Chat system-prompt assembly.
//!
//! `build_system_prompt` is a pure function of the static profile, the
//! requested context tag, and any attachments. Attachment content is
//! truncated and appended verbatim; prompt-injection hardening is an
//! accepted non-goal for a single-owner portfolio site.

use serde::Deserialize;

use crate::profile::Profile;

const ATTACHMENT_PREVIEW_CHARS: usize = 1000;

/// Conversation mode requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptContext {
    General,
    CareerAdvice,
    TechnicalDeepDive,
    LeadershipInsights,
    DocumentAnalysis,
}

impl PromptContext {
    /// Unknown tags land on career advice, the site's default mode.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "general" => Self::General,
            "career-advice" => Self::CareerAdvice,
            "technical-deep-dive" => Self::TechnicalDeepDive,
            "leadership-insights" => Self::LeadershipInsights,
            "document-analysis" => Self::DocumentAnalysis,
            _ => Self::CareerAdvice,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::CareerAdvice => "career-advice",
            Self::TechnicalDeepDive => "technical-deep-dive",
            Self::LeadershipInsights => "leadership-insights",
            Self::DocumentAnalysis => "document-analysis",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            Self::General => {
                "Answer general questions about the owner's background, \
                 availability, and interests. Keep answers short and friendly."
            }
            Self::CareerAdvice => {
                "The visitor is likely a recruiter or founder weighing a \
                 conversation. Highlight leadership scope, outcomes, and the kind \
                 of roles the owner is a strong fit for. Be concrete, never \
                 salesy."
            }
            Self::TechnicalDeepDive => {
                "The visitor is technical. Go into architecture decisions, \
                 trade-offs, and stack details from the work history. Prefer \
                 specifics over generalities."
            }
            Self::LeadershipInsights => {
                "Focus on org design, hiring, process, and management philosophy \
                 evidenced by the work history. Draw on the achievements rather \
                 than inventing positions the owner has not stated."
            }
            Self::DocumentAnalysis => {
                "The visitor attached one or more documents (for example a job \
                 description). Analyze them against the owner's background and \
                 answer with reference to both."
            }
        }
    }
}

/// Pre-extracted attachment text supplied with a chat request. Upload and
/// text extraction happen elsewhere; only `{name, content}` arrives here.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

/// Builds the full system prompt for one chat exchange.
pub fn build_system_prompt(
    profile: &Profile,
    context: PromptContext,
    attachments: &[Attachment],
) -> String {
    let mut prompt = format!(
        "You are the assistant on {name}'s personal website. You answer visitor \
         questions about {name}'s experience, skills, and fit for roles, speaking \
         about {name} in the third person.\n\n\
         Ground every answer in the résumé below. If a question cannot be \
         answered from it, say so briefly instead of guessing. For anything \
         unrelated to {name}'s professional life, politely steer the \
         conversation back.\n\n\
         === RESUME ===\n{resume}\n=== END RESUME ===\n\n{guidance}",
        name = profile.name,
        resume = render_profile(profile),
        guidance = context.guidance(),
    );

    if context == PromptContext::DocumentAnalysis && !attachments.is_empty() {
        prompt.push_str("\n\nATTACHED DOCUMENTS:");
        for attachment in attachments {
            prompt.push_str(&format!(
                "\n--- {} ---\n{}",
                attachment.name,
                truncate_chars(&attachment.content, ATTACHMENT_PREVIEW_CHARS)
            ));
        }
    }

    prompt
}

/// Renders the profile as plain text for prompt embedding.
pub fn render_profile(profile: &Profile) -> String {
    let mut out = format!(
        "{} | {} | {}\n{} years of experience | {} | {}\n\nSUMMARY\n{}\n",
        profile.name,
        profile.title,
        profile.location,
        profile.years_of_experience,
        profile.email,
        profile.website,
        profile.summary,
    );

    out.push_str("\nEXPERIENCE\n");
    for role in &profile.roles {
        out.push_str(&format!(
            "{} at {} ({})\n",
            role.title, role.company, role.period
        ));
        for achievement in &role.achievements {
            out.push_str(&format!("  - {achievement}\n"));
        }
        if !role.technologies.is_empty() {
            out.push_str(&format!("  Stack: {}\n", role.technologies.join(", ")));
        }
    }

    out.push_str("\nSKILLS\n");
    for group in &profile.skills {
        out.push_str(&format!("{}: {}\n", group.category, group.items.join(", ")));
    }

    out.push_str("\nEDUCATION\n");
    for education in &profile.education {
        out.push_str(&format!(
            "{} in {}, {} ({})\n",
            education.degree, education.field, education.institution, education.year,
        ));
    }

    if !profile.projects.is_empty() {
        out.push_str("\nPROJECTS & TALKS\n");
        for project in &profile.projects {
            out.push_str(&format!("{}: {}", project.name, project.description));
            if let Some(url) = &project.url {
                out.push_str(&format!(" ({url})"));
            }
            out.push('\n');
        }
    }

    out
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_context_falls_back_to_career_advice() {
        assert_eq!(PromptContext::parse("career-advice"), PromptContext::CareerAdvice);
        assert_eq!(PromptContext::parse("technical-deep-dive"), PromptContext::TechnicalDeepDive);
        assert_eq!(PromptContext::parse("pirate-mode"), PromptContext::CareerAdvice);
        assert_eq!(PromptContext::parse(""), PromptContext::CareerAdvice);
    }

    #[test]
    fn test_prompt_contains_resume_and_guidance() {
        let profile = Profile::owner();
        let prompt = build_system_prompt(&profile, PromptContext::TechnicalDeepDive, &[]);
        assert!(prompt.contains(&profile.name));
        assert!(prompt.contains("=== RESUME ==="));
        assert!(prompt.contains("Driftline"));
        assert!(prompt.contains("trade-offs"));
    }

    #[test]
    fn test_attachments_only_included_for_document_analysis() {
        let profile = Profile::owner();
        let attachments = vec![Attachment {
            name: "jd.txt".to_string(),
            content: "Staff engineer role".to_string(),
        }];

        let with = build_system_prompt(&profile, PromptContext::DocumentAnalysis, &attachments);
        assert!(with.contains("ATTACHED DOCUMENTS"));
        assert!(with.contains("Staff engineer role"));

        let without = build_system_prompt(&profile, PromptContext::CareerAdvice, &attachments);
        assert!(!without.contains("ATTACHED DOCUMENTS"));
    }

    #[test]
    fn test_attachment_content_truncates_at_preview_limit() {
        let profile = Profile::owner();
        let attachments = vec![Attachment {
            name: "long.txt".to_string(),
            content: "x".repeat(5000),
        }];
        let prompt = build_system_prompt(&profile, PromptContext::DocumentAnalysis, &attachments);
        let run = prompt.chars().filter(|c| *c == 'x').count();
        assert!(run <= ATTACHMENT_PREVIEW_CHARS + 10, "got {run}");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 4), "héll");
        assert_eq!(truncate_chars(text, 100), text);
    }
}
