// Job-matcher prompt templates.

pub const JOB_MATCH_SYSTEM: &str = "\
You are a candid technical recruiter evaluating how well a specific candidate \
fits a job description. Score honestly: a weak fit must get a low score. \
Never invent experience the candidate does not have.";

pub const JOB_MATCH_PROMPT: &str = r#"Evaluate the candidate below against the job description.

CANDIDATE:
{profile}

JOB DESCRIPTION:
{job_description}

OUTPUT SCHEMA (return exactly this structure):
{
  "matchScore": 0-100 integer,
  "matchReasons": ["3 to 5 concrete reasons this candidate fits"],
  "missingSkills": ["requirements the candidate does not clearly meet"],
  "recommendations": ["what the candidate should emphasize when applying"],
  "company": "string",
  "position": "string",
  "roleLevel": "junior" | "mid" | "senior" | "staff" | "principal" | "director" | "vp" | "executive",
  "location": "string",
  "salaryRange": "string"
}

RULES:
1. matchScore reflects evidence in the candidate profile, not potential.
2. matchReasons must cite specific achievements or skills from the profile.
3. Use "Not specified" for metadata the description does not state.
4. Return ONLY the JSON object, nothing else, no code fences."#;

pub fn build_match_prompt(profile_text: &str, job_description: &str) -> String {
    JOB_MATCH_PROMPT
        .replace("{profile}", profile_text)
        .replace("{job_description}", job_description)
}
