//! Adzuna job-board source. Requires an app id and key; the source is
//! only constructed when both are configured.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;
use crate::jobsearch::{strip_html, JobPosting, JobSource, DESCRIPTION_SNIPPET_CHARS};

const API_URL: &str = "https://api.adzuna.com/v1/api/jobs/us/search/1";
const RESULTS_PER_PAGE: u32 = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct AdzunaSource {
    client: reqwest::Client,
    app_id: String,
    app_key: String,
}

#[derive(Deserialize)]
struct AdzunaResponse {
    results: Vec<AdzunaJob>,
}

#[derive(Deserialize)]
struct AdzunaJob {
    title: String,
    redirect_url: String,
    #[serde(default)]
    description: String,
    company: Option<AdzunaCompany>,
    location: Option<AdzunaLocation>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    #[serde(default)]
    created: String,
}

#[derive(Deserialize)]
struct AdzunaCompany {
    #[serde(default)]
    display_name: String,
}

#[derive(Deserialize)]
struct AdzunaLocation {
    #[serde(default)]
    display_name: String,
}

impl AdzunaSource {
    pub fn new(app_id: String, app_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            app_id,
            app_key,
        }
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    fn name(&self) -> &'static str {
        "adzuna"
    }

    async fn search(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<Vec<JobPosting>, AppError> {
        let mut params = vec![
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
            ("what", query.to_string()),
            ("results_per_page", RESULTS_PER_PAGE.to_string()),
            ("content-type", "application/json".to_string()),
        ];
        if let Some(place) = location {
            params.push(("where", place.to_string()));
        }

        let response = self
            .client
            .get(API_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("adzuna request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "adzuna returned {status}"
            )));
        }

        let parsed: AdzunaResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("adzuna decode failed: {e}")))?;

        Ok(parsed.results.into_iter().map(into_posting).collect())
    }
}

fn into_posting(job: AdzunaJob) -> JobPosting {
    JobPosting {
        title: job.title,
        company: job
            .company
            .map(|c| c.display_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        location: job
            .location
            .map(|l| l.display_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Not specified".to_string()),
        url: job.redirect_url,
        source: "adzuna".to_string(),
        salary: format_salary(job.salary_min, job.salary_max),
        posted_at: Some(job.created).filter(|d| !d.trim().is_empty()),
        description: Some(strip_html(&job.description, DESCRIPTION_SNIPPET_CHARS))
            .filter(|d| !d.is_empty()),
    }
}

fn format_salary(min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > 0.0 && hi > 0.0 => {
            Some(format!("${:.0} - ${:.0}", lo, hi))
        }
        (Some(lo), None) if lo > 0.0 => Some(format!("${:.0}+", lo)),
        (None, Some(hi)) if hi > 0.0 => Some(format!("up to ${:.0}", hi)),
        _ => None,
    }
}
