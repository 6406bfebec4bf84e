use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{BulkJob, JobUpdate};

/// Keyed job progress storage. The in-memory implementation is process-local;
/// cross-instance polling needs a shared backend behind this trait.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: BulkJob);

    async fn get(&self, job_id: Uuid) -> Option<BulkJob>;

    /// Apply an update and return the new snapshot; `None` if the job is gone
    async fn update(&self, job_id: Uuid, update: JobUpdate) -> Option<BulkJob>;

    /// Returns the removed job, if any
    async fn remove(&self, job_id: Uuid) -> Option<BulkJob>;

    /// Drop expired jobs and return how many were evicted
    async fn evict_expired(&self, now: DateTime<Utc>) -> usize;
}

pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, BulkJob>>,
    retention: Duration,
    stale_after: Duration,
}

impl MemoryJobStore {
    pub fn new(retention: Duration, stale_after: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
            stale_after,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: BulkJob) {
        self.jobs.write().await.insert(job.job_id, job);
    }

    async fn get(&self, job_id: Uuid) -> Option<BulkJob> {
        let now = Utc::now();
        {
            let jobs = self.jobs.read().await;
            match jobs.get(&job_id) {
                None => return None,
                Some(job) if !job.is_expired(now, self.retention, self.stale_after) => {
                    return Some(job.clone());
                }
                Some(_) => {}
            }
        }

        // Expired but not yet reaped
        let mut jobs = self.jobs.write().await;
        if jobs
            .get(&job_id)
            .is_some_and(|job| job.is_expired(now, self.retention, self.stale_after))
        {
            jobs.remove(&job_id);
        }
        None
    }

    async fn update(&self, job_id: Uuid, update: JobUpdate) -> Option<BulkJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id)?;
        job.apply(update, Utc::now());
        Some(job.clone())
    }

    async fn remove(&self, job_id: Uuid) -> Option<BulkJob> {
        self.jobs.write().await.remove(&job_id)
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.is_expired(now, self.retention, self.stale_after));
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryJobStore {
        MemoryJobStore::new(Duration::from_secs(3600), Duration::from_secs(6 * 3600))
    }

    #[tokio::test]
    async fn update_returns_snapshot_and_none_for_unknown() {
        let store = store();
        let job = BulkJob::new("u", Uuid::new_v4(), 2);
        let id = job.job_id;
        store.insert(job).await;

        let snapshot = store
            .update(id, JobUpdate::RowSucceeded { row_index: 0 })
            .await
            .unwrap();
        assert_eq!(snapshot.processed_rows, 1);
        assert!(store.update(Uuid::new_v4(), JobUpdate::Completed).await.is_none());
    }

    #[tokio::test]
    async fn evicts_terminal_jobs_after_retention() {
        let store = store();
        let mut finished = BulkJob::new("u", Uuid::new_v4(), 1);
        let started = Utc::now() - chrono::Duration::hours(2);
        finished.started_at = started;
        finished.apply(JobUpdate::Completed, started);
        let finished_id = finished.job_id;

        let running = BulkJob::new("u", Uuid::new_v4(), 1);
        let running_id = running.job_id;

        store.insert(finished).await;
        store.insert(running).await;

        // Lazy eviction on read
        assert!(store.get(finished_id).await.is_none());
        assert_eq!(store.len().await, 1);

        assert_eq!(store.evict_expired(Utc::now()).await, 0);
        assert!(store.get(running_id).await.is_some());
        assert_eq!(store.evict_expired(Utc::now() + chrono::Duration::hours(7)).await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = store();
        let job = BulkJob::new("u", Uuid::new_v4(), 1);
        let id = job.job_id;
        store.insert(job).await;

        assert!(store.remove(id).await.is_some());
        assert!(store.remove(id).await.is_none());
        assert!(store.get(id).await.is_none());
    }
}
