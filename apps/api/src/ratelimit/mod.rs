//! Request rate limiting.
//!
//! Six independent limiter instances gate the endpoint classes, all backed
//! by the same [`CounterStore`]. The store is optional: what happens when it
//! is missing or unreachable is decided per instance by [`LimitPolicy`], not
//! buried in error handling.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{LimitConfig, LimitSettings};
use crate::errors::AppError;

pub mod blocklist;
pub mod middleware;
mod sliding;
pub mod store;

pub use store::{CounterStore, MemoryStore, RedisStore};

pub(crate) const KEY_PREFIX: &str = "vitrine";

/// What a limiter does when its backing store fails or is unconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Allow the request with full quota, log the condition. Availability
    /// over strictness.
    FailOpen,
    /// Reject the request.
    FailClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    FixedWindow,
    SlidingWindow,
}

/// Verdict for one request against one limiter.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix seconds when the current window ends.
    pub reset: u64,
    /// Populated only on rejection.
    pub retry_after_secs: Option<u64>,
}

impl RateLimitResult {
    pub fn into_error(self) -> AppError {
        AppError::RateLimited {
            limit: self.limit,
            retry_after_secs: self.retry_after_secs.unwrap_or(0),
        }
    }
}

pub struct RateLimiter {
    class: &'static str,
    settings: LimitSettings,
    algorithm: Algorithm,
    policy: LimitPolicy,
    store: Option<Arc<dyn CounterStore>>,
}

impl RateLimiter {
    pub fn new(
        class: &'static str,
        settings: LimitSettings,
        algorithm: Algorithm,
        policy: LimitPolicy,
        store: Option<Arc<dyn CounterStore>>,
    ) -> Self {
        Self {
            class,
            settings,
            algorithm,
            policy,
            store,
        }
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Counts this request and decides. Store failures never surface as
    /// errors; the policy turns them into a verdict.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        let now_secs = unix_now_secs();
        let Some(store) = &self.store else {
            return self.on_store_failure(now_secs, "store not configured");
        };

        match self.algorithm {
            Algorithm::FixedWindow => {
                let window = self.settings.window_secs.max(1);
                let bucket = now_secs / window;
                let key = format!(
                    "{KEY_PREFIX}:rl:{}:{identifier}:{bucket}",
                    self.class
                );
                match store.incr_window(&key, window + 1).await {
                    Ok(count) => {
                        let max = self.settings.max_requests;
                        let reset = (bucket + 1) * window;
                        let allowed = count <= max;
                        RateLimitResult {
                            allowed,
                            limit: max,
                            remaining: max.saturating_sub(count),
                            reset,
                            retry_after_secs: (!allowed)
                                .then(|| reset.saturating_sub(now_secs).max(1)),
                        }
                    }
                    Err(e) => self.on_store_failure(now_secs, &e.to_string()),
                }
            }
            Algorithm::SlidingWindow => {
                let key = format!("{KEY_PREFIX}:rl:{}:{identifier}", self.class);
                let window_ms = self.settings.window_secs * 1000;
                let verdict = sliding::count_in_window(
                    store.as_ref(),
                    &key,
                    unix_now_ms(),
                    window_ms,
                    self.settings.max_requests,
                )
                .await;
                match verdict {
                    Ok(v) => {
                        let max = self.settings.max_requests;
                        RateLimitResult {
                            allowed: v.allowed,
                            limit: max,
                            remaining: max.saturating_sub(v.count),
                            // without reading the oldest entry back the exact
                            // free-up time is unknown; a full window is the
                            // conservative bound
                            reset: now_secs + self.settings.window_secs,
                            retry_after_secs: (!v.allowed).then_some(self.settings.window_secs),
                        }
                    }
                    Err(e) => self.on_store_failure(now_secs, &e.to_string()),
                }
            }
        }
    }

    /// Drops the live counter state for one identifier (admin reset).
    pub async fn reset(&self, identifier: &str) -> Result<(), AppError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let key = match self.algorithm {
            Algorithm::FixedWindow => {
                let window = self.settings.window_secs.max(1);
                let bucket = unix_now_secs() / window;
                format!("{KEY_PREFIX}:rl:{}:{identifier}:{bucket}", self.class)
            }
            Algorithm::SlidingWindow => {
                format!("{KEY_PREFIX}:rl:{}:{identifier}", self.class)
            }
        };
        store
            .delete(&key)
            .await
            .map_err(|e| AppError::ExternalService(format!("rate limit store: {e}")))
    }

    fn on_store_failure(&self, now_secs: u64, reason: &str) -> RateLimitResult {
        let max = self.settings.max_requests;
        let reset = now_secs + self.settings.window_secs;
        match self.policy {
            LimitPolicy::FailOpen => {
                tracing::warn!(
                    class = self.class,
                    reason,
                    "rate limit store unavailable, failing open"
                );
                RateLimitResult {
                    allowed: true,
                    limit: max,
                    remaining: max,
                    reset,
                    retry_after_secs: None,
                }
            }
            LimitPolicy::FailClosed => {
                tracing::warn!(
                    class = self.class,
                    reason,
                    "rate limit store unavailable, failing closed"
                );
                RateLimitResult {
                    allowed: false,
                    limit: max,
                    remaining: 0,
                    reset,
                    retry_after_secs: Some(self.settings.window_secs),
                }
            }
        }
    }
}

/// The named limiter instances, one per endpoint class.
pub struct Limiters {
    pub general: RateLimiter,
    pub auth: RateLimiter,
    pub ai: RateLimiter,
    pub resume: RateLimiter,
    pub job_search: RateLimiter,
    pub contact: RateLimiter,
}

impl Limiters {
    pub fn new(config: &LimitConfig, store: Option<Arc<dyn CounterStore>>) -> Self {
        let make = |class, settings, algorithm| {
            RateLimiter::new(class, settings, algorithm, LimitPolicy::FailOpen, store.clone())
        };
        Self {
            general: make("general", config.general, Algorithm::FixedWindow),
            auth: make("auth", config.auth, Algorithm::FixedWindow),
            ai: make("ai", config.ai, Algorithm::SlidingWindow),
            resume: make("resume", config.resume, Algorithm::FixedWindow),
            job_search: make("job_search", config.job_search, Algorithm::FixedWindow),
            contact: make("contact", config.contact, Algorithm::FixedWindow),
        }
    }

    pub fn by_class(&self, class: &str) -> Option<&RateLimiter> {
        match class {
            "general" => Some(&self.general),
            "auth" => Some(&self.auth),
            "ai" => Some(&self.ai),
            "resume" => Some(&self.resume),
            "job_search" => Some(&self.job_search),
            "contact" => Some(&self.contact),
            _ => None,
        }
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn incr_window(&self, _key: &str, _ttl_secs: u64) -> anyhow::Result<u32> {
            Err(anyhow!("connection refused"))
        }
        async fn push_event(
            &self,
            _key: &str,
            _member: &str,
            _now_ms: u64,
            _window_ms: u64,
        ) -> anyhow::Result<u32> {
            Err(anyhow!("connection refused"))
        }
        async fn retract_event(&self, _key: &str, _member: &str) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }
        async fn delete(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }
        async fn set_flag(&self, _key: &str, _ttl_secs: Option<u64>) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }
        async fn flag_exists(&self, _key: &str) -> anyhow::Result<bool> {
            Err(anyhow!("connection refused"))
        }
        async fn clear_flag(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }
    }

    // hour-long window so a bucket rollover cannot land mid-test
    fn fixed_limiter(
        max: u32,
        policy: LimitPolicy,
        store: Option<Arc<dyn CounterStore>>,
    ) -> RateLimiter {
        RateLimiter::new(
            "general",
            LimitSettings::new(3600, max),
            Algorithm::FixedWindow,
            policy,
            store,
        )
    }

    #[tokio::test]
    async fn test_fixed_window_allows_then_denies() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = fixed_limiter(3, LimitPolicy::FailOpen, Some(store));

        for expected_remaining in [2, 1, 0] {
            let result = limiter.check("1.2.3.4").await;
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
            assert_eq!(result.limit, 3);
            assert!(result.retry_after_secs.is_none());
        }

        let denied = limiter.check("1.2.3.4").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        let retry = denied.retry_after_secs.unwrap();
        assert!(retry >= 1 && retry <= 3600);
    }

    #[tokio::test]
    async fn test_window_rollover_starts_a_fresh_count() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(
            "general",
            LimitSettings::new(1, 2),
            Algorithm::FixedWindow,
            LimitPolicy::FailOpen,
            Some(store),
        );

        // land just past a bucket edge so the filling checks share one bucket
        let into_bucket = unix_now_ms() % 1000;
        tokio::time::sleep(std::time::Duration::from_millis(1050 - into_bucket)).await;

        limiter.check("1.2.3.4").await;
        limiter.check("1.2.3.4").await;
        assert!(!limiter.check("1.2.3.4").await.allowed);

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let fresh = limiter.check("1.2.3.4").await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
    }

    #[tokio::test]
    async fn test_identifiers_count_independently() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = fixed_limiter(1, LimitPolicy::FailOpen, Some(store));

        assert!(limiter.check("1.1.1.1").await.allowed);
        assert!(!limiter.check("1.1.1.1").await.allowed);
        assert!(limiter.check("2.2.2.2").await.allowed);
    }

    #[tokio::test]
    async fn test_fail_open_allows_on_store_error() {
        let limiter = fixed_limiter(5, LimitPolicy::FailOpen, Some(Arc::new(DownStore)));
        let result = limiter.check("1.2.3.4").await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 5);
    }

    #[tokio::test]
    async fn test_fail_closed_denies_on_store_error() {
        let limiter = fixed_limiter(5, LimitPolicy::FailClosed, Some(Arc::new(DownStore)));
        let result = limiter.check("1.2.3.4").await;
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.retry_after_secs, Some(3600));
    }

    #[tokio::test]
    async fn test_missing_store_follows_policy() {
        let open = fixed_limiter(5, LimitPolicy::FailOpen, None);
        assert!(open.check("1.2.3.4").await.allowed);

        let closed = fixed_limiter(5, LimitPolicy::FailClosed, None);
        assert!(!closed.check("1.2.3.4").await.allowed);
    }

    #[tokio::test]
    async fn test_sliding_limiter_denies_over_quota() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(
            "ai",
            LimitSettings::new(60, 2),
            Algorithm::SlidingWindow,
            LimitPolicy::FailOpen,
            Some(store),
        );
        assert!(limiter.check("u1").await.allowed);
        assert!(limiter.check("u1").await.allowed);
        let denied = limiter.check("u1").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs, Some(60));
    }

    #[tokio::test]
    async fn test_reset_clears_current_bucket() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = fixed_limiter(2, LimitPolicy::FailOpen, Some(store));

        limiter.check("1.2.3.4").await;
        limiter.check("1.2.3.4").await;
        assert!(!limiter.check("1.2.3.4").await.allowed);

        limiter.reset("1.2.3.4").await.unwrap();
        assert!(limiter.check("1.2.3.4").await.allowed);
    }

    #[tokio::test]
    async fn test_rejection_converts_to_app_error() {
        let limiter = fixed_limiter(0, LimitPolicy::FailOpen, Some(Arc::new(MemoryStore::new())));
        let denied = limiter.check("1.2.3.4").await;
        assert!(!denied.allowed);
        let err = denied.into_error();
        assert_eq!(err.code(), "RATE_LIMITED");
    }

    #[test]
    fn test_limiters_lookup_by_class() {
        let config = LimitConfig {
            general: LimitSettings::new(60, 60),
            auth: LimitSettings::new(900, 5),
            ai: LimitSettings::new(60, 10),
            resume: LimitSettings::new(60, 3),
            job_search: LimitSettings::new(60, 10),
            contact: LimitSettings::new(60, 3),
        };
        let limiters = Limiters::new(&config, None);
        assert_eq!(limiters.by_class("ai").map(|l| l.class()), Some("ai"));
        assert!(limiters.by_class("unknown").is_none());
    }
}
