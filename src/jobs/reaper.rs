use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::store::JobStore;

/// Background eviction of finished and stale bulk jobs
pub struct JobReaper {
    jobs: Arc<dyn JobStore>,
    poll_interval: Duration,
}

impl JobReaper {
    pub fn spawn(jobs: Arc<dyn JobStore>, poll_interval: Duration) -> JoinHandle<()> {
        let reaper = Self { jobs, poll_interval };
        tokio::spawn(async move {
            reaper.start().await;
        })
    }

    async fn start(&self) {
        info!("Starting bulk job reaper with interval {:?}", self.poll_interval);

        let mut interval = interval(self.poll_interval);
        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    async fn sweep(&self) -> usize {
        let evicted = self.jobs.evict_expired(Utc::now()).await;
        if evicted > 0 {
            info!(evicted, "Evicted expired bulk jobs");
        } else {
            debug!("Job reaper: nothing to evict");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::model::{BulkJob, JobUpdate};
    use crate::jobs::store::MemoryJobStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn sweep_drops_only_expired_jobs() {
        let store = Arc::new(MemoryJobStore::new(
            Duration::from_secs(60),
            Duration::from_secs(3600),
        ));

        let mut old = BulkJob::new("u", Uuid::new_v4(), 1);
        let long_ago = Utc::now() - chrono::Duration::minutes(5);
        old.started_at = long_ago;
        old.apply(JobUpdate::Completed, long_ago);
        store.insert(old).await;
        store.insert(BulkJob::new("u", Uuid::new_v4(), 1)).await;

        let reaper = JobReaper {
            jobs: store.clone(),
            poll_interval: Duration::from_secs(1),
        };
        assert_eq!(reaper.sweep().await, 1);
        assert_eq!(store.len().await, 1);
    }
}
