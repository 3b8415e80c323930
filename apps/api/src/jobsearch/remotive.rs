//! Remotive job-board source. Public API, no credentials.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;
use crate::jobsearch::{strip_html, JobPosting, JobSource, DESCRIPTION_SNIPPET_CHARS};

const API_URL: &str = "https://remotive.com/api/remote-jobs";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RemotiveSource {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RemotiveResponse {
    jobs: Vec<RemotiveJob>,
}

#[derive(Deserialize)]
struct RemotiveJob {
    url: String,
    title: String,
    company_name: String,
    #[serde(default)]
    candidate_required_location: String,
    #[serde(default)]
    salary: String,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    description: String,
}

impl RemotiveSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for RemotiveSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobSource for RemotiveSource {
    fn name(&self) -> &'static str {
        "remotive"
    }

    async fn search(
        &self,
        query: &str,
        _location: Option<&str>,
    ) -> Result<Vec<JobPosting>, AppError> {
        let response = self
            .client
            .get(API_URL)
            .query(&[("search", query)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("remotive request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "remotive returned {status}"
            )));
        }

        let parsed: RemotiveResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("remotive decode failed: {e}")))?;

        Ok(parsed.jobs.into_iter().map(into_posting).collect())
    }
}

fn into_posting(job: RemotiveJob) -> JobPosting {
    let location = if job.candidate_required_location.trim().is_empty() {
        "Remote".to_string()
    } else {
        job.candidate_required_location
    };
    JobPosting {
        title: job.title,
        company: job.company_name,
        location,
        url: job.url,
        source: "remotive".to_string(),
        salary: Some(job.salary).filter(|s| !s.trim().is_empty()),
        posted_at: Some(job.publication_date).filter(|d| !d.trim().is_empty()),
        description: Some(strip_html(&job.description, DESCRIPTION_SNIPPET_CHARS))
            .filter(|d| !d.is_empty()),
    }
}
