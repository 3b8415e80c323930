// Résumé-customizer and cover-letter prompt templates.

pub const RESUME_SYSTEM: &str = "\
You are an expert résumé writer. You tailor an existing candidate profile to \
a specific job description. Reorder and rephrase honestly; never invent \
experience, employers, dates, or metrics that are not in the profile.";

pub const RESUME_PROMPT: &str = r#"Tailor the candidate's profile to the job description below.

CANDIDATE PROFILE:
{profile}

JOB DESCRIPTION:
{job_description}

OUTPUT SCHEMA (return exactly this structure):
{
  "summary": "2-3 sentence professional summary rewritten for this role",
  "keyAchievements": ["the 3-5 profile achievements most relevant to this role"],
  "relevantExperience": ["roles/projects from the profile, most relevant first, one line each"],
  "technicalSkills": ["profile skills this description asks for, most relevant first"],
  "recommendations": ["2-3 concrete suggestions for positioning this application"]
}

RULES:
1. Every achievement and skill must come from the profile verbatim or lightly rephrased.
2. Order by relevance to this specific description.
3. Return ONLY the JSON object, nothing else, no code fences."#;

pub const COVER_LETTER_SYSTEM: &str = "\
You are an expert cover-letter writer. You write in a confident, direct, \
first-person voice on behalf of the candidate. Grounded and specific; no \
clichés, no flattery padding, no invented experience.";

pub const COVER_LETTER_PROMPT: &str = r#"Write a cover letter from the candidate below for the job description below.

CANDIDATE PROFILE:
{profile}

JOB DESCRIPTION:
{job_description}

TARGET: {position} at {company}

OUTPUT SCHEMA (return exactly this structure):
{
  "coverLetter": "the complete letter, 250-400 words, paragraphs separated by blank lines"
}

RULES:
1. Open with a specific reason this role fits, not a generic greeting.
2. Cite 2-3 achievements from the profile that map to the description.
3. Return ONLY the JSON object, nothing else, no code fences."#;

pub fn build_resume_prompt(profile_text: &str, job_description: &str) -> String {
    RESUME_PROMPT
        .replace("{profile}", profile_text)
        .replace("{job_description}", job_description)
}

pub fn build_cover_letter_prompt(
    profile_text: &str,
    job_description: &str,
    position: &str,
    company: &str,
) -> String {
    COVER_LETTER_PROMPT
        .replace("{profile}", profile_text)
        .replace("{job_description}", job_description)
        .replace("{position}", position)
        .replace("{company}", company)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_prompt_fills_placeholders() {
        let prompt = build_resume_prompt("PROFILE TEXT", "JD TEXT");
        assert!(prompt.contains("PROFILE TEXT"));
        assert!(prompt.contains("JD TEXT"));
        assert!(!prompt.contains("{profile}"));
    }

    #[test]
    fn test_cover_letter_prompt_fills_target() {
        let prompt = build_cover_letter_prompt("P", "J", "CTO", "Meridian");
        assert!(prompt.contains("CTO at Meridian"));
        assert!(!prompt.contains("{position}"));
        assert!(!prompt.contains("{company}"));
    }
}
