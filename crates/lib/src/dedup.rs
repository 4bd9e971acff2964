//! Redelivery filter: (message id, conversation id, platform) keys seen recently.
//!
//! Platforms retry webhooks they consider unacknowledged, so the same message can
//! arrive more than once, sometimes concurrently. A key is recorded the moment it is
//! first seen, under the same lock as the lookup. Keys expire after a fixed window and
//! the oldest are evicted first when the filter is full.

use crate::channels::Platform;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Identifies one chat message across redeliveries.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DedupKey {
    pub message_id: String,
    pub conversation_id: String,
    pub platform: Platform,
}

/// Every key in `seen` has exactly one entry in `order`, oldest at the front.
#[derive(Default)]
struct SeenKeys {
    seen: HashMap<DedupKey, Instant>,
    order: VecDeque<(DedupKey, Instant)>,
}

impl SeenKeys {
    fn evict_expired(&mut self, now: Instant, ttl: Duration) {
        while self
            .order
            .front()
            .is_some_and(|(_, at)| now.duration_since(*at) >= ttl)
        {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((key, _)) = self.order.pop_front() {
            self.seen.remove(&key);
        }
    }
}

pub struct DedupFilter {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<SeenKeys>,
}

impl DedupFilter {
    /// `capacity` below 1 is treated as 1.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(SeenKeys::default()),
        }
    }

    /// Record `key`. Returns true when it is new, false when it was already seen within the window.
    pub async fn check_and_insert(&self, key: DedupKey) -> bool {
        let now = Instant::now();
        let mut keys = self.inner.lock().await;
        keys.evict_expired(now, self.ttl);
        if keys.seen.contains_key(&key) {
            return false;
        }
        while keys.seen.len() >= self.capacity {
            keys.evict_oldest();
        }
        keys.order.push_back((key.clone(), now));
        keys.seen.insert(key, now);
        true
    }

    /// Number of keys currently remembered (expired keys may still count until the next insert).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.seen.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
