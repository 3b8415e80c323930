//! Résumé customization and cover-letter generation.
//!
//! Both endpoints follow the matcher's pattern: model call through the
//! fallback executor, tiered parse, canned skeleton when nothing usable
//! comes back. The skeletons are built from the live profile so even the
//! degraded path shows real data.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm::parse::parse_structured;
use crate::llm::prompts::json_system_prompt;
use crate::llm::ChatMessage;
use crate::matcher::metadata::NOT_SPECIFIED;
use crate::models::artifact::{record_artifact, ArtifactKind};
use crate::profile::prompts::render_profile;
use crate::profile::Profile;
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::resume::prompts::{
    build_cover_letter_prompt, build_resume_prompt, COVER_LETTER_SYSTEM, RESUME_SYSTEM,
};
use crate::state::AppState;

pub mod prompts;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRequest {
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCustomization {
    pub summary: String,
    pub key_achievements: Vec<String>,
    #[serde(default)]
    pub relevant_experience: Vec<String>,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    #[serde(flatten)]
    pub customization: ResumeCustomization,
    pub fallback: bool,
    pub provider: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverLetterPayload {
    cover_letter: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterResponse {
    pub cover_letter: String,
    pub fallback: bool,
    pub provider: String,
}

/// POST /api/v1/resume-customizer
pub async fn handle_resume_customizer(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<ResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::missing_fields(&["jobDescription"]));
    }
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.resume, &ip).await?;

    let messages = vec![
        ChatMessage::system(json_system_prompt(RESUME_SYSTEM)),
        ChatMessage::user(build_resume_prompt(
            &render_profile(&state.profile),
            &req.job_description,
        )),
    ];
    let outcome = state.executor.execute(&messages, "resume", None).await?;

    let parsed = parse_structured(&outcome.text, || fallback_customization(&state.profile));
    let fallback = parsed.is_fallback();
    let customization = parsed.value;

    if let Ok(content) = serde_json::to_value(&customization) {
        record_artifact(
            &state.db,
            ArtifactKind::ResumeCustomization,
            &req.job_description,
            &content,
            &outcome.provider,
        )
        .await;
    }

    Ok(Json(ResumeResponse {
        customization,
        fallback,
        provider: outcome.provider,
    }))
}

/// POST /api/v1/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::missing_fields(&["jobDescription"]));
    }
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.resume, &ip).await?;

    // client-supplied target wins; otherwise the extractor reads the JD
    let meta = state.metadata.extract(&req.job_description);
    let company = req.company.unwrap_or(meta.company);
    let position = req.position.unwrap_or(meta.position);

    let messages = vec![
        ChatMessage::system(json_system_prompt(COVER_LETTER_SYSTEM)),
        ChatMessage::user(build_cover_letter_prompt(
            &render_profile(&state.profile),
            &req.job_description,
            &position,
            &company,
        )),
    ];
    let outcome = state.executor.execute(&messages, "cover_letter", None).await?;

    let parsed = parse_structured::<CoverLetterPayload, _>(&outcome.text, || CoverLetterPayload {
        cover_letter: fallback_cover_letter(&state.profile, &company, &position),
    });
    let fallback = parsed.is_fallback();
    let cover_letter = parsed.value.cover_letter;

    record_artifact(
        &state.db,
        ArtifactKind::CoverLetter,
        &req.job_description,
        &serde_json::json!({ "coverLetter": cover_letter }),
        &outcome.provider,
    )
    .await;

    Ok(Json(CoverLetterResponse {
        cover_letter,
        fallback,
        provider: outcome.provider,
    }))
}

/// Canned skeleton assembled from the live profile.
fn fallback_customization(profile: &Profile) -> ResumeCustomization {
    let key_achievements = profile
        .roles
        .first()
        .map(|role| role.achievements.iter().take(3).cloned().collect())
        .unwrap_or_default();

    ResumeCustomization {
        summary: profile.summary.clone(),
        key_achievements,
        relevant_experience: profile
            .roles
            .iter()
            .map(|role| format!("{} at {} ({})", role.title, role.company, role.period))
            .collect(),
        technical_skills: profile
            .all_skills()
            .into_iter()
            .take(10)
            .map(str::to_string)
            .collect(),
        recommendations: vec![
            "Automatic tailoring was unavailable; this is the untailored profile".to_string(),
            "Reorder the achievements against the description before sending".to_string(),
        ],
    }
}

fn fallback_cover_letter(profile: &Profile, company: &str, position: &str) -> String {
    let target = if company == NOT_SPECIFIED {
        "your team".to_string()
    } else {
        company.to_string()
    };
    let role = if position == NOT_SPECIFIED {
        "this role".to_string()
    } else {
        format!("the {position} role")
    };
    format!(
        "Dear Hiring Team,\n\nI am writing to express interest in {role} at {target}. I bring \
         {}+ years of engineering and leadership experience, most recently as {}, where I led \
         platform rebuilds, scaled the engineering organization, and owned infrastructure \
         strategy end to end.\n\nI would welcome the chance to talk about how that experience \
         maps to your needs.\n\nBest regards,\n{}",
        profile.years_of_experience, profile.title, profile.name
    )
}
