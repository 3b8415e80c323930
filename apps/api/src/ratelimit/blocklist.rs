//! Explicit IP deny-list, a separate concern from rate counting.

use std::sync::Arc;

use crate::errors::AppError;
use crate::ratelimit::store::CounterStore;
use crate::ratelimit::KEY_PREFIX;

pub struct IpBlocker {
    store: Option<Arc<dyn CounterStore>>,
}

impl IpBlocker {
    pub fn new(store: Option<Arc<dyn CounterStore>>) -> Self {
        Self { store }
    }

    fn key(ip: &str) -> String {
        format!("{KEY_PREFIX}:blocked:{ip}")
    }

    /// A missing or failing store blocks nobody.
    pub async fn is_blocked(&self, ip: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.flag_exists(&Self::key(ip)).await {
            Ok(blocked) => blocked,
            Err(e) => {
                tracing::warn!(ip, error = %e, "deny-list check failed, allowing");
                false
            }
        }
    }

    /// Blocks an IP, optionally expiring after `ttl_secs`.
    pub async fn block(&self, ip: &str, ttl_secs: Option<u64>) -> Result<(), AppError> {
        let Some(store) = &self.store else {
            return Err(AppError::Config(
                "REDIS_URL is not configured; IP blocking needs a store".to_string(),
            ));
        };
        store
            .set_flag(&Self::key(ip), ttl_secs)
            .await
            .map_err(|e| AppError::ExternalService(format!("deny-list store: {e}")))
    }

    pub async fn unblock(&self, ip: &str) -> Result<(), AppError> {
        let Some(store) = &self.store else {
            return Err(AppError::Config(
                "REDIS_URL is not configured; IP blocking needs a store".to_string(),
            ));
        };
        store
            .clear_flag(&Self::key(ip))
            .await
            .map_err(|e| AppError::ExternalService(format!("deny-list store: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::store::MemoryStore;

    #[tokio::test]
    async fn test_block_and_unblock_roundtrip() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let blocker = IpBlocker::new(Some(store));

        assert!(!blocker.is_blocked("9.9.9.9").await);
        blocker.block("9.9.9.9", None).await.unwrap();
        assert!(blocker.is_blocked("9.9.9.9").await);
        blocker.unblock("9.9.9.9").await.unwrap();
        assert!(!blocker.is_blocked("9.9.9.9").await);
    }

    #[tokio::test]
    async fn test_block_with_expired_ttl_clears() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let blocker = IpBlocker::new(Some(store));

        blocker.block("9.9.9.9", Some(0)).await.unwrap();
        assert!(!blocker.is_blocked("9.9.9.9").await);
    }

    #[tokio::test]
    async fn test_missing_store_blocks_nobody_and_rejects_writes() {
        let blocker = IpBlocker::new(None);
        assert!(!blocker.is_blocked("9.9.9.9").await);
        let err = blocker.block("9.9.9.9", None).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_MISSING");
    }
}
