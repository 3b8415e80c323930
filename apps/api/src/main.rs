mod chat;
mod config;
mod contact;
mod db;
mod errors;
mod jobsearch;
mod llm;
mod matcher;
mod models;
mod profile;
mod ratelimit;
mod resume;
mod routes;
mod state;
mod usage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::jobsearch::adzuna::AdzunaSource;
use crate::jobsearch::remotive::RemotiveSource;
use crate::jobsearch::JobSource;
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::executor::FallbackExecutor;
use crate::llm::openai::OpenAiProvider;
use crate::llm::CompletionProvider;
use crate::matcher::metadata::KeywordMetadataExtractor;
use crate::profile::Profile;
use crate::ratelimit::blocklist::IpBlocker;
use crate::ratelimit::store::{CounterStore, RedisStore};
use crate::ratelimit::Limiters;
use crate::routes::build_router;
use crate::state::AppState;
use crate::usage::UsageRecorder;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (only DATABASE_URL is hard-required)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitrine API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize Redis. Optional: without it every limiter obeys its
    // failure policy (open) and the deny list is inert.
    let store: Option<Arc<dyn CounterStore>> = match &config.redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(redis) => {
                info!("Redis connection established");
                Some(Arc::new(redis))
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, rate limiting disabled");
                None
            }
        },
        None => {
            warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let limiters = Arc::new(Limiters::new(&config.limits, store.clone()));
    let blocker = Arc::new(IpBlocker::new(store));

    // Assemble the AI provider chain. Order is fallback order.
    let mut providers: Vec<Arc<dyn CompletionProvider>> = Vec::new();
    if let Some(key) = &config.anthropic_api_key {
        providers.push(Arc::new(AnthropicProvider::new(key.clone())));
    }
    if let Some(key) = &config.openai_api_key {
        providers.push(Arc::new(OpenAiProvider::new(key.clone())));
    }
    let executor = Arc::new(FallbackExecutor::new(
        providers,
        Arc::new(UsageRecorder::new(db.clone())),
    ));
    if executor.has_providers() {
        info!("AI providers: {:?}", executor.provider_names());
    } else {
        warn!("No AI provider configured, AI endpoints will return errors");
    }

    // Job boards. Remotive needs no key; Adzuna joins when credentialed.
    let mut job_sources: Vec<Arc<dyn JobSource>> = vec![Arc::new(RemotiveSource::new())];
    if let (Some(id), Some(key)) = (&config.adzuna_app_id, &config.adzuna_app_key) {
        job_sources.push(Arc::new(AdzunaSource::new(id.clone(), key.clone())));
    }
    info!(
        "Job sources: {:?}",
        job_sources.iter().map(|s| s.name()).collect::<Vec<_>>()
    );

    // Build app state
    let state = AppState {
        config: Arc::new(config.clone()),
        db,
        limiters,
        blocker,
        executor,
        profile: Arc::new(Profile::owner()),
        metadata: Arc::new(KeywordMetadataExtractor),
        job_sources: Arc::new(job_sources),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
