use serde_json::Value;
use uuid::Uuid;

/// Artifact kind discriminator stored in the `kind` column of
/// `generated_artifacts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    JobMatch,
    ResumeCustomization,
    CoverLetter,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobMatch => "job_match",
            Self::ResumeCustomization => "resume_customization",
            Self::CoverLetter => "cover_letter",
        }
    }
}

/// Best-effort artifact persistence. Generation results are useful history,
/// not part of the response contract, so failures are logged and swallowed.
pub async fn record_artifact(
    pool: &sqlx::PgPool,
    kind: ArtifactKind,
    job_description: &str,
    content: &Value,
    provider: &str,
) {
    let result = sqlx::query(
        "INSERT INTO generated_artifacts (id, kind, job_description, content, provider)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(kind.as_str())
    .bind(job_description)
    .bind(content)
    .bind(provider)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(kind = kind.as_str(), error = %e, "failed to record artifact");
    }
}
