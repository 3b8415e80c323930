//! Job-search aggregation across external boards.
//!
//! Every board sits behind the [`JobSource`] trait. A search fans out to
//! all configured sources concurrently; a source that errors logs a
//! warning and contributes nothing, so one flaky board never takes the
//! endpoint down. Only when every source fails does the request error.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::state::AppState;

pub mod adzuna;
pub mod remotive;

/// Longest description snippet carried in a posting.
pub const DESCRIPTION_SNIPPET_CHARS: usize = 280;

const PER_SOURCE_CAP: usize = 25;
const MAX_RESULTS: usize = 50;

/// A normalized posting, whichever board it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One external job board.
#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<Vec<JobPosting>, AppError>;
}

#[derive(Debug, Deserialize)]
pub struct JobSearchQuery {
    #[serde(default)]
    pub query: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<JobPosting>,
    pub count: usize,
    pub sources: Vec<String>,
}

/// GET /api/v1/job-search
pub async fn handle_job_search(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<JobSearchQuery>,
) -> Result<Json<JobSearchResponse>, AppError> {
    if params.query.trim().is_empty() {
        return Err(AppError::missing_fields(&["query"]));
    }
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.job_search, &ip).await?;

    let outcome = search_all(
        &state.job_sources,
        params.query.trim(),
        params.location.as_deref(),
    )
    .await?;

    Ok(Json(JobSearchResponse {
        count: outcome.jobs.len(),
        jobs: outcome.jobs,
        sources: outcome.sources,
    }))
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub jobs: Vec<JobPosting>,
    pub sources: Vec<String>,
}

/// Queries every source concurrently and merges whatever succeeded,
/// capped per source and overall, deduplicated by title and company.
pub async fn search_all(
    sources: &[Arc<dyn JobSource>],
    query: &str,
    location: Option<&str>,
) -> Result<SearchOutcome, AppError> {
    if sources.is_empty() {
        return Err(AppError::Config("no job sources configured".to_string()));
    }

    let searches = sources.iter().map(|s| s.search(query, location));
    let results = join_all(searches).await;

    let mut jobs = Vec::new();
    let mut succeeded = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(mut postings) => {
                postings.truncate(PER_SOURCE_CAP);
                jobs.extend(postings);
                succeeded.push(source.name().to_string());
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "job source failed");
            }
        }
    }

    if succeeded.is_empty() {
        return Err(AppError::ExternalService(
            "all job sources failed".to_string(),
        ));
    }

    let mut jobs = dedupe(jobs);
    jobs.truncate(MAX_RESULTS);
    Ok(SearchOutcome {
        jobs,
        sources: succeeded,
    })
}

/// Drops postings that repeat an earlier title and company pair. Source
/// order decides which copy survives.
fn dedupe(jobs: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| {
            seen.insert((
                job.title.trim().to_lowercase(),
                job.company.trim().to_lowercase(),
            ))
        })
        .collect()
}

/// Flattens HTML to plain text: tags removed, whitespace runs collapsed,
/// truncated on a char boundary.
pub fn strip_html(html: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(html.len().min(max_chars * 4));
    let mut in_tag = false;
    let mut last_was_space = true;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            c => {
                out.push(c);
                last_was_space = false;
            }
        }
    }
    let trimmed = out.trim_end();
    trimmed.chars().take(max_chars).collect()
}
