use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{GenerationRepository, MemoryGenerationRepository};
use crate::generation::ListingGenerator;
use crate::jobs::{BulkJobRunner, JobStore, MemoryJobStore};
use crate::quota::{MemoryQuotaStore, PlanLimits, QuotaGate, QuotaStore};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub quota: Arc<QuotaGate>,
    pub runner: Arc<BulkJobRunner>,
    pub jobs: Arc<dyn JobStore>,
    pub generations: Arc<dyn GenerationRepository>,
    pub generator: Arc<dyn ListingGenerator>,
    /// Present when running against Postgres; used by the health check
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        quota_store: Arc<dyn QuotaStore>,
        generations: Arc<dyn GenerationRepository>,
        generator: Arc<dyn ListingGenerator>,
        db: Option<PgPool>,
    ) -> Self {
        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(
            config.bulk.job_retention(),
            config.bulk.stale_job_after(),
        ));
        let quota = Arc::new(QuotaGate::new(quota_store, PlanLimits::from(&config.quota)));
        let runner = Arc::new(BulkJobRunner::new(
            jobs.clone(),
            quota.clone(),
            generator.clone(),
            generations.clone(),
            config.bulk.generation_timeout(),
        ));

        Self {
            config: Arc::new(config),
            quota,
            runner,
            jobs,
            generations,
            generator,
            db,
        }
    }

    /// Process-local stores only; nothing survives a restart
    pub fn in_memory(config: AppConfig, generator: Arc<dyn ListingGenerator>) -> Self {
        Self::new(
            config,
            Arc::new(MemoryQuotaStore::new()),
            Arc::new(MemoryGenerationRepository::new()),
            generator,
            None,
        )
    }
}
