//! Storage backends for the rate limiters and the IP deny-list.
//!
//! The limiters talk to a [`CounterStore`] rather than to Redis directly.
//! Production uses [`RedisStore`]; tests use [`MemoryStore`] for
//! deterministic window behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Fixed window: increments the bucket counter and refreshes its TTL.
    /// Returns the post-increment count. The TTL is garbage collection only;
    /// window boundaries come from the bucketed key itself.
    async fn incr_window(&self, key: &str, ttl_secs: u64) -> Result<u32>;

    /// Sliding window: prunes entries with timestamps at or before
    /// `now_ms - window_ms`, records `member` at `now_ms`, and returns the
    /// number of entries left in the window.
    async fn push_event(&self, key: &str, member: &str, now_ms: u64, window_ms: u64)
        -> Result<u32>;

    /// Removes a member recorded by `push_event`, used to retract the
    /// just-added entry after an over-limit verdict.
    async fn retract_event(&self, key: &str, member: &str) -> Result<()>;

    /// Drops all state under `key` (admin reset).
    async fn delete(&self, key: &str) -> Result<()>;

    async fn set_flag(&self, key: &str, ttl_secs: Option<u64>) -> Result<()>;
    async fn flag_exists(&self, key: &str) -> Result<bool>;
    async fn clear_flag(&self, key: &str) -> Result<()>;
}

/// Redis-backed store. `ConnectionManager` reconnects on its own, so a clone
/// per operation is cheap and safe under concurrency.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn incr_window(&self, key: &str, ttl_secs: u64) -> Result<u32> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().incr(key, 1u32).expire(key, ttl_secs as i64);
        let (count, _): (u32, i32) = pipe.query_async(&mut conn).await?;
        Ok(count)
    }

    async fn push_event(
        &self,
        key: &str,
        member: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<u32> {
        let mut conn = self.conn.clone();
        let cutoff = now_ms.saturating_sub(window_ms) as i64;
        let ttl_secs = (window_ms / 1000 + 1) as i64;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .zrembyscore(key, 0i64, cutoff)
            .zadd(key, member, now_ms as i64)
            .zcard(key)
            .expire(key, ttl_secs);
        let (_, _, count, _): (i64, i64, u32, i32) = pipe.query_async(&mut conn).await?;
        Ok(count)
    }

    async fn retract_event(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zrem(key, member).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn set_flag(&self, key: &str, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(key, 1u8, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, 1u8).await?;
            }
        }
        Ok(())
    }

    async fn flag_exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn clear_flag(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}

struct CounterEntry {
    count: u32,
    expires_at: Instant,
}

/// In-memory store with the same window semantics as Redis.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, CounterEntry>>,
    events: Mutex<HashMap<String, VecDeque<(u64, String)>>>,
    flags: Mutex<HashMap<String, Option<Instant>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr_window(&self, key: &str, ttl_secs: u64) -> Result<u32> {
        let mut counters = self.counters.lock().map_err(|_| anyhow!("lock poisoned"))?;
        let now = Instant::now();
        let ttl = Duration::from_secs(ttl_secs);
        let entry = counters.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: now + ttl,
        });
        if entry.expires_at <= now {
            entry.count = 0;
        }
        entry.expires_at = now + ttl;
        entry.count += 1;
        Ok(entry.count)
    }

    async fn push_event(
        &self,
        key: &str,
        member: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<u32> {
        let mut events = self.events.lock().map_err(|_| anyhow!("lock poisoned"))?;
        let deque = events.entry(key.to_string()).or_default();
        let cutoff = now_ms.saturating_sub(window_ms);
        while deque.front().is_some_and(|(ts, _)| *ts <= cutoff) {
            deque.pop_front();
        }
        deque.push_back((now_ms, member.to_string()));
        Ok(deque.len() as u32)
    }

    async fn retract_event(&self, key: &str, member: &str) -> Result<()> {
        let mut events = self.events.lock().map_err(|_| anyhow!("lock poisoned"))?;
        if let Some(deque) = events.get_mut(key) {
            deque.retain(|(_, m)| m != member);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.counters
            .lock()
            .map_err(|_| anyhow!("lock poisoned"))?
            .remove(key);
        self.events
            .lock()
            .map_err(|_| anyhow!("lock poisoned"))?
            .remove(key);
        Ok(())
    }

    async fn set_flag(&self, key: &str, ttl_secs: Option<u64>) -> Result<()> {
        let expires = ttl_secs.map(|t| Instant::now() + Duration::from_secs(t));
        self.flags
            .lock()
            .map_err(|_| anyhow!("lock poisoned"))?
            .insert(key.to_string(), expires);
        Ok(())
    }

    async fn flag_exists(&self, key: &str) -> Result<bool> {
        let mut flags = self.flags.lock().map_err(|_| anyhow!("lock poisoned"))?;
        match flags.get(key) {
            Some(Some(expires)) if *expires <= Instant::now() => {
                flags.remove(key);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn clear_flag(&self, key: &str) -> Result<()> {
        self.flags
            .lock()
            .map_err(|_| anyhow!("lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_counter_increments() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_window("k", 60).await.unwrap(), 1);
        assert_eq!(store.incr_window("k", 60).await.unwrap(), 2);
        assert_eq!(store.incr_window("other", 60).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_counter_zero_ttl_resets() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_window("k", 0).await.unwrap(), 1);
        // previous entry already expired, count starts over
        assert_eq!(store.incr_window("k", 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_push_event_prunes_old_entries() {
        let store = MemoryStore::new();
        assert_eq!(store.push_event("k", "a", 1_000, 10_000).await.unwrap(), 1);
        assert_eq!(store.push_event("k", "b", 5_000, 10_000).await.unwrap(), 2);
        // window moved past the first entry
        assert_eq!(store.push_event("k", "c", 12_000, 10_000).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retract_event_removes_member() {
        let store = MemoryStore::new();
        store.push_event("k", "a", 1_000, 10_000).await.unwrap();
        store.push_event("k", "b", 2_000, 10_000).await.unwrap();
        store.retract_event("k", "b").await.unwrap();
        assert_eq!(store.push_event("k", "c", 3_000, 10_000).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_clears_both_shapes() {
        let store = MemoryStore::new();
        store.incr_window("k", 60).await.unwrap();
        store.push_event("k", "a", 1_000, 10_000).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.incr_window("k", 60).await.unwrap(), 1);
        assert_eq!(store.push_event("k", "b", 2_000, 10_000).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_flags_respect_ttl() {
        let store = MemoryStore::new();
        store.set_flag("blocked", None).await.unwrap();
        assert!(store.flag_exists("blocked").await.unwrap());
        store.clear_flag("blocked").await.unwrap();
        assert!(!store.flag_exists("blocked").await.unwrap());

        store.set_flag("temp", Some(0)).await.unwrap();
        assert!(!store.flag_exists("temp").await.unwrap());
    }
}
