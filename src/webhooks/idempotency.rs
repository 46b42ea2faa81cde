use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use tokio::sync::Mutex;

/// Trait for remembering delivered webhook event ids
///
/// Providers retry deliveries, so the same event id can arrive more than once.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Record an event id, returning `true` if it had not been seen before
    ///
    /// The check and the insert happen atomically.
    async fn first_delivery(&self, event_id: &str) -> Result<bool>;

    /// Check if an event id has already been recorded
    async fn is_processed(&self, event_id: &str) -> Result<bool>;

    /// Forget an event id so a failed delivery can be retried
    async fn forget(&self, event_id: &str) -> Result<()>;
}

struct Seen {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

/// In-memory idempotency store with a bounded number of remembered ids
///
/// When full, the oldest id is evicted first.
pub struct MemoryIdempotencyStore {
    seen: Mutex<Seen>,
    capacity: usize,
}

impl MemoryIdempotencyStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(Seen {
                ids: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.ids.len()
    }
}

impl Default for MemoryIdempotencyStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn first_delivery(&self, event_id: &str) -> Result<bool> {
        let mut seen = self.seen.lock().await;
        if seen.ids.contains(event_id) {
            return Ok(false);
        }

        while seen.order.len() >= self.capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.ids.remove(&oldest);
            }
        }

        seen.ids.insert(event_id.to_string());
        seen.order.push_back(event_id.to_string());
        Ok(true)
    }

    async fn is_processed(&self, event_id: &str) -> Result<bool> {
        Ok(self.seen.lock().await.ids.contains(event_id))
    }

    async fn forget(&self, event_id: &str) -> Result<()> {
        let mut seen = self.seen.lock().await;
        if seen.ids.remove(event_id) {
            seen.order.retain(|id| id != event_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_delivery_then_duplicate() {
        let store = MemoryIdempotencyStore::default();
        assert!(store.first_delivery("evt_1").await.unwrap());
        assert!(!store.first_delivery("evt_1").await.unwrap());
        assert!(store.is_processed("evt_1").await.unwrap());
        assert!(!store.is_processed("evt_2").await.unwrap());
    }

    #[tokio::test]
    async fn test_forget_allows_redelivery() {
        let store = MemoryIdempotencyStore::default();
        store.first_delivery("evt_1").await.unwrap();
        store.forget("evt_1").await.unwrap();
        assert!(!store.is_processed("evt_1").await.unwrap());
        assert!(store.first_delivery("evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = MemoryIdempotencyStore::new(2);
        store.first_delivery("a").await.unwrap();
        store.first_delivery("b").await.unwrap();
        store.first_delivery("c").await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(!store.is_processed("a").await.unwrap());
        assert!(store.is_processed("b").await.unwrap());
        assert!(store.is_processed("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_capacity_still_remembers_latest() {
        let store = MemoryIdempotencyStore::new(0);
        assert!(store.first_delivery("a").await.unwrap());
        assert!(!store.first_delivery("a").await.unwrap());
    }
}
