use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use super::plan::PlanTier;

#[derive(Debug, Error)]
pub enum QuotaStoreError {
    #[error("Quota store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Durable per-user, per-month counter with an atomic conditional increment
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Units consumed by the user in the given month; no record means zero
    async fn used(&self, user_id: &str, month_key: &str) -> Result<u32, QuotaStoreError>;

    /// Adds `count` to the counter only when the result stays within `cap`.
    /// Returns the new counter value, or `None` when the cap would be exceeded.
    async fn try_increment(
        &self,
        user_id: &str,
        month_key: &str,
        plan: PlanTier,
        count: u32,
        cap: u32,
    ) -> Result<Option<u32>, QuotaStoreError>;
}

/// Process-local quota store; the mutex makes check-and-increment a single step.
/// Only counters are kept, the plan tier is persisted by the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    used_counts: Mutex<HashMap<(String, String), u32>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter, e.g. to simulate partially consumed quota
    pub async fn set_used(&self, user_id: &str, month_key: &str, used: u32) {
        let mut used_counts = self.used_counts.lock().await;
        used_counts.insert((user_id.to_string(), month_key.to_string()), used);
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn used(&self, user_id: &str, month_key: &str) -> Result<u32, QuotaStoreError> {
        let used_counts = self.used_counts.lock().await;
        Ok(used_counts
            .get(&(user_id.to_string(), month_key.to_string()))
            .copied()
            .unwrap_or(0))
    }

    async fn try_increment(
        &self,
        user_id: &str,
        month_key: &str,
        _plan: PlanTier,
        count: u32,
        cap: u32,
    ) -> Result<Option<u32>, QuotaStoreError> {
        let mut used_counts = self.used_counts.lock().await;
        let used = used_counts
            .entry((user_id.to_string(), month_key.to_string()))
            .or_insert(0);

        let next = used.saturating_add(count);
        if next > cap {
            return Ok(None);
        }

        *used = next;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_record_reads_as_zero() {
        let store = MemoryQuotaStore::new();
        assert_eq!(store.used("user_1", "2026-10").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn increment_refuses_past_cap() {
        let store = MemoryQuotaStore::new();
        assert_eq!(
            store.try_increment("user_1", "2026-10", PlanTier::Free, 3, 4).await.unwrap(),
            Some(3)
        );
        assert_eq!(
            store.try_increment("user_1", "2026-10", PlanTier::Free, 2, 4).await.unwrap(),
            None
        );
        assert_eq!(store.used("user_1", "2026-10").await.unwrap(), 3);
    }
}
