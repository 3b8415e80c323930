use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::jobsearch::JobSource;
use crate::llm::executor::FallbackExecutor;
use crate::matcher::metadata::MetadataExtractor;
use crate::profile::Profile;
use crate::ratelimit::blocklist::IpBlocker;
use crate::ratelimit::Limiters;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,
    pub limiters: Arc<Limiters>,
    pub blocker: Arc<IpBlocker>,
    /// Provider chain behind every AI feature. All completions go through it.
    pub executor: Arc<FallbackExecutor>,
    pub profile: Arc<Profile>,
    /// Pluggable job metadata extractor. Default: KeywordMetadataExtractor.
    pub metadata: Arc<dyn MetadataExtractor>,
    pub job_sources: Arc<Vec<Arc<dyn JobSource>>>,
}
