//! Best-effort AI usage accounting.
//!
//! Every provider attempt (success or failure) becomes one row in
//! `ai_usage`. Failures to write are logged and swallowed; analytics must
//! never take a user-facing request down with them.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// One provider attempt, as recorded.
#[derive(Debug, Clone)]
pub struct UsageEvent {
    pub user_id: Option<Uuid>,
    pub provider: String,
    pub model: String,
    pub tokens_used: i64,
    pub context: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub response_time_ms: Option<i64>,
}

/// Destination for usage events. The executor records through this seam so
/// tests can capture events without a database.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, event: UsageEvent);
}

/// Postgres-backed sink.
pub struct UsageRecorder {
    pool: PgPool,
}

impl UsageRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageSink for UsageRecorder {
    async fn record(&self, event: UsageEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO ai_usage
                (id, user_id, provider, model, tokens_used, context, success,
                 error_message, response_time_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(&event.provider)
        .bind(&event.model)
        .bind(event.tokens_used)
        .bind(&event.context)
        .bind(event.success)
        .bind(&event.error_message)
        .bind(event.response_time_ms)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                provider = %event.provider,
                context = %event.context,
                error = %e,
                "failed to record ai usage"
            );
        }
    }
}

/// Rough token count: one token per four characters, rounded up. Providers
/// report exact numbers but the accounting here only needs the same order
/// of magnitude across providers.
pub fn estimate_tokens(text: &str) -> i64 {
    let chars = text.chars().count() as i64;
    (chars + 3) / 4
}
