//! Job-fit analysis: scores a job description against the owner's profile.
//!
//! The model does the scoring; the metadata extractor backfills role facts
//! the model leaves blank; normalization enforces the response contract
//! (score in 0..=100, three to five match reasons) no matter which parse
//! tier produced the report.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm::parse::parse_structured;
use crate::llm::prompts::json_system_prompt;
use crate::llm::ChatMessage;
use crate::matcher::metadata::JobMetadata;
use crate::matcher::prompts::{build_match_prompt, JOB_MATCH_SYSTEM};
use crate::models::artifact::{record_artifact, ArtifactKind};
use crate::profile::prompts::render_profile;
use crate::profile::Profile;
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::state::AppState;

pub mod metadata;
pub mod prompts;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchRequest {
    #[serde(default)]
    pub job_description: String,
}

/// The analysis object. Score and reasons must come from the model; the
/// metadata fields default to empty and are backfilled by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchReport {
    pub match_score: i64,
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub role_level: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary_range: String,
}

#[derive(Debug, Serialize)]
pub struct JobMatchResponse {
    #[serde(flatten)]
    pub report: JobMatchReport,
    pub fallback: bool,
    pub provider: String,
}

/// POST /api/v1/job-matcher
pub async fn handle_job_match(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<JobMatchRequest>,
) -> Result<Json<JobMatchResponse>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::missing_fields(&["jobDescription"]));
    }
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.ai, &ip).await?;

    let meta = state.metadata.extract(&req.job_description);
    let messages = vec![
        ChatMessage::system(json_system_prompt(JOB_MATCH_SYSTEM)),
        ChatMessage::user(build_match_prompt(
            &render_profile(&state.profile),
            &req.job_description,
        )),
    ];
    let outcome = state.executor.execute(&messages, "job_match", None).await?;

    let (report, fallback) = build_report(&outcome.text, &meta, &state.profile);

    if let Ok(content) = serde_json::to_value(&report) {
        record_artifact(
            &state.db,
            ArtifactKind::JobMatch,
            &req.job_description,
            &content,
            &outcome.provider,
        )
        .await;
    }

    Ok(Json(JobMatchResponse {
        report,
        fallback,
        provider: outcome.provider,
    }))
}

/// Parses model text through the tiered post-processor and normalizes the
/// result. Pure, so the whole pipeline below the provider call is testable.
fn build_report(text: &str, meta: &JobMetadata, profile: &Profile) -> (JobMatchReport, bool) {
    let parsed = parse_structured(text, || fallback_report(profile));
    let fallback = parsed.is_fallback();
    (normalize(parsed.value, meta, profile), fallback)
}

/// Canned report served when the model output is unusable.
fn fallback_report(profile: &Profile) -> JobMatchReport {
    JobMatchReport {
        match_score: 50,
        match_reasons: vec![
            format!(
                "{} brings {}+ years of engineering and leadership experience",
                profile.name, profile.years_of_experience
            ),
            "Deep background in distributed systems and cloud infrastructure".to_string(),
            "Has scaled engineering organizations through rapid growth".to_string(),
        ],
        missing_skills: vec![],
        recommendations: vec![
            "The automatic analysis could not be completed; review the description manually"
                .to_string(),
        ],
        company: String::new(),
        position: String::new(),
        role_level: String::new(),
        location: String::new(),
        salary_range: String::new(),
    }
}

fn normalize(mut report: JobMatchReport, meta: &JobMetadata, profile: &Profile) -> JobMatchReport {
    report.match_score = report.match_score.clamp(0, 100);

    report.match_reasons.retain(|r| !r.trim().is_empty());
    report.match_reasons.truncate(5);
    let padding = [
        format!(
            "{}+ years of senior engineering and leadership experience",
            profile.years_of_experience
        ),
        "Breadth across cloud platforms, distributed systems, and org building".to_string(),
        "History of delivering platform work at comparable scale".to_string(),
    ];
    for pad in padding {
        if report.match_reasons.len() >= 3 {
            break;
        }
        report.match_reasons.push(pad);
    }

    backfill(&mut report.company, &meta.company);
    backfill(&mut report.position, &meta.position);
    backfill(&mut report.role_level, &meta.role_level);
    backfill(&mut report.location, &meta.location);
    backfill(&mut report.salary_range, &meta.salary_range);
    report
}

fn backfill(field: &mut String, value: &str) {
    if field.trim().is_empty() {
        *field = value.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::metadata::{KeywordMetadataExtractor, MetadataExtractor, NOT_SPECIFIED};

    fn meta_fixture() -> JobMetadata {
        KeywordMetadataExtractor.extract(
            "Chief Technology Officer at Meridian\nLocation: Remote\nPay: $250k - $300k",
        )
    }

    #[test]
    fn test_valid_model_json_keeps_contract() {
        let text = r#"{
            "matchScore": 91,
            "matchReasons": ["Led re-platforming at scale", "Owns cloud budget", "Grew org to 65"],
            "missingSkills": ["Rust in production"],
            "recommendations": ["Lead with the Driftline migration story"],
            "company": "Meridian",
            "position": "CTO",
            "roleLevel": "executive",
            "location": "Remote",
            "salaryRange": "$250k - $300k"
        }"#;
        let (report, fallback) = build_report(text, &meta_fixture(), &Profile::owner());
        assert!(!fallback);
        assert_eq!(report.match_score, 91);
        assert_eq!(report.match_reasons.len(), 3);
        assert_eq!(report.company, "Meridian");
    }

    #[test]
    fn test_score_clamps_to_range() {
        let text = r#"{"matchScore": 175, "matchReasons": ["a", "b", "c"]}"#;
        let (report, _) = build_report(text, &meta_fixture(), &Profile::owner());
        assert_eq!(report.match_score, 100);

        let text = r#"{"matchScore": -5, "matchReasons": ["a", "b", "c"]}"#;
        let (report, _) = build_report(text, &meta_fixture(), &Profile::owner());
        assert_eq!(report.match_score, 0);
    }

    #[test]
    fn test_reasons_padded_to_at_least_three() {
        let text = r#"{"matchScore": 70, "matchReasons": ["only one"]}"#;
        let (report, _) = build_report(text, &meta_fixture(), &Profile::owner());
        assert!(report.match_reasons.len() >= 3);
        assert_eq!(report.match_reasons[0], "only one");
    }

    #[test]
    fn test_reasons_truncated_to_five() {
        let text = r#"{"matchScore": 70,
            "matchReasons": ["1", "2", "3", "4", "5", "6", "7"]}"#;
        let (report, _) = build_report(text, &meta_fixture(), &Profile::owner());
        assert_eq!(report.match_reasons.len(), 5);
    }

    #[test]
    fn test_metadata_backfills_only_empty_fields() {
        let text = r#"{
            "matchScore": 80,
            "matchReasons": ["a", "b", "c"],
            "company": "Stated By Model"
        }"#;
        let (report, _) = build_report(text, &meta_fixture(), &Profile::owner());
        assert_eq!(report.company, "Stated By Model");
        assert_eq!(report.position, "Chief Technology Officer");
        assert_eq!(report.location, "Remote");
    }

    #[test]
    fn test_garbage_yields_canned_report_with_contract_intact() {
        let (report, fallback) =
            build_report("I'd rather not answer.", &meta_fixture(), &Profile::owner());
        assert!(fallback);
        assert!((0..=100).contains(&report.match_score));
        assert!(report.match_reasons.len() >= 3 && report.match_reasons.len() <= 5);
        assert_eq!(report.role_level, "executive");
    }

    #[test]
    fn test_empty_metadata_stays_not_specified() {
        let meta = KeywordMetadataExtractor.extract("");
        let (report, _) = build_report("garbage", &meta, &Profile::owner());
        assert_eq!(report.company, NOT_SPECIFIED);
        assert_eq!(report.salary_range, NOT_SPECIFIED);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let (report, fallback) = build_report("garbage", &meta_fixture(), &Profile::owner());
        let json = serde_json::to_value(JobMatchResponse {
            report,
            fallback,
            provider: "anthropic".to_string(),
        })
        .unwrap();
        assert!(json["matchScore"].is_i64());
        assert!(json["matchReasons"].is_array());
        assert!(json["salaryRange"].is_string());
        assert_eq!(json["fallback"], true);
        assert_eq!(json["provider"], "anthropic");
    }
}
