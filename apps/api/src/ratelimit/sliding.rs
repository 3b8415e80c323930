//! Sliding-window counting over a sorted-set shaped store.

use anyhow::Result;
use uuid::Uuid;

use crate::ratelimit::store::CounterStore;

pub(crate) struct SlideVerdict {
    pub allowed: bool,
    pub count: u32,
}

/// Timestamps alone collide under concurrency, so each event gets a unique
/// member id.
fn member_id(now_ms: u64) -> String {
    format!("{now_ms}-{}", Uuid::new_v4().simple())
}

/// Prunes the window, records this request, and decides.
///
/// On an over-limit verdict the just-added member is retracted. The retract
/// races with concurrent writers: another check may observe the entry before
/// the removal lands, briefly overcounting by one. Known gap, accepted.
pub(crate) async fn count_in_window(
    store: &dyn CounterStore,
    key: &str,
    now_ms: u64,
    window_ms: u64,
    max_requests: u32,
) -> Result<SlideVerdict> {
    let member = member_id(now_ms);
    let count = store.push_event(key, &member, now_ms, window_ms).await?;
    if count > max_requests {
        store.retract_event(key, &member).await?;
        return Ok(SlideVerdict {
            allowed: false,
            count,
        });
    }
    Ok(SlideVerdict {
        allowed: true,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::store::MemoryStore;

    #[tokio::test]
    async fn test_allows_within_window() {
        let store = MemoryStore::new();
        let v1 = count_in_window(&store, "k", 1_000, 60_000, 2).await.unwrap();
        let v2 = count_in_window(&store, "k", 1_001, 60_000, 2).await.unwrap();
        assert!(v1.allowed);
        assert!(v2.allowed);
        assert_eq!(v2.count, 2);
    }

    #[tokio::test]
    async fn test_over_limit_retracts_entry() {
        let store = MemoryStore::new();
        count_in_window(&store, "k", 1_000, 60_000, 2).await.unwrap();
        count_in_window(&store, "k", 1_001, 60_000, 2).await.unwrap();
        let denied = count_in_window(&store, "k", 1_002, 60_000, 2).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.count, 3);

        // retraction keeps the set at the limit, so the count stays steady
        let denied_again = count_in_window(&store, "k", 1_003, 60_000, 2).await.unwrap();
        assert_eq!(denied_again.count, 3);
    }

    #[tokio::test]
    async fn test_window_movement_frees_capacity() {
        let store = MemoryStore::new();
        count_in_window(&store, "k", 1_000, 10_000, 2).await.unwrap();
        count_in_window(&store, "k", 2_000, 10_000, 2).await.unwrap();
        assert!(!count_in_window(&store, "k", 3_000, 10_000, 2).await.unwrap().allowed);
        // at 11_500 the first entry (1_000) has aged out but the second has not
        let freed = count_in_window(&store, "k", 11_500, 10_000, 2).await.unwrap();
        assert!(freed.allowed);
        assert_eq!(freed.count, 2);
    }
}
