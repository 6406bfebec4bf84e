use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{BulkImportStatus, GenerationSource, NewGeneration};
use crate::database::GenerationRepository;
use crate::generation::ListingGenerator;
use crate::listing::CsvRow;
use crate::quota::{QuotaError, QuotaGate};

use super::model::{BulkJob, JobUpdate};
use super::store::JobStore;

/// How one row ended, from the loop's point of view
enum RowOutcome {
    Saved,
    Failed(String),
    Fatal(String),
    Cancelled,
}

/// How the whole batch ended
enum RunOutcome {
    Finished,
    Fatal(String),
    Cancelled,
}

/// Drives bulk jobs: one spawned task per job, rows strictly in input order.
pub struct BulkJobRunner {
    jobs: Arc<dyn JobStore>,
    quota: Arc<QuotaGate>,
    generator: Arc<dyn ListingGenerator>,
    repository: Arc<dyn GenerationRepository>,
    generation_timeout: Duration,
    cancellations: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl BulkJobRunner {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        quota: Arc<QuotaGate>,
        generator: Arc<dyn ListingGenerator>,
        repository: Arc<dyn GenerationRepository>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            jobs,
            quota,
            generator,
            repository,
            generation_timeout,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    pub fn jobs(&self) -> &Arc<dyn JobStore> {
        &self.jobs
    }

    /// Register a pending job and spawn its processing task. Returns immediately.
    pub async fn start(self: &Arc<Self>, user: AuthUser, rows: Vec<CsvRow>, bulk_import_id: Uuid) -> BulkJob {
        let job = BulkJob::new(user.user_id.clone(), bulk_import_id, rows.len());
        let job_id = job.job_id;
        let token = CancellationToken::new();

        self.jobs.insert(job.clone()).await;
        self.cancellations.lock().await.insert(job_id, token.clone());

        info!(
            job_id = %job_id,
            bulk_import_id = %bulk_import_id,
            user_id = %user.user_id,
            total_rows = rows.len(),
            "Bulk job accepted"
        );

        let runner = Arc::clone(self);
        tokio::spawn(async move {
            runner.run(job_id, bulk_import_id, user, rows, token).await;
        });

        job
    }

    pub async fn get_progress(&self, job_id: Uuid) -> Option<BulkJob> {
        self.jobs.get(job_id).await
    }

    /// Remove the job and stop its task before the next row. Safe to call repeatedly
    /// or for ids that never existed.
    pub async fn cleanup(&self, job_id: Uuid) {
        if let Some(token) = self.cancellations.lock().await.remove(&job_id) {
            token.cancel();
        }
        if self.jobs.remove(job_id).await.is_some() {
            info!(job_id = %job_id, "Bulk job cleaned up");
        }
    }

    async fn run(
        &self,
        job_id: Uuid,
        bulk_import_id: Uuid,
        user: AuthUser,
        rows: Vec<CsvRow>,
        token: CancellationToken,
    ) {
        let mut successful = 0u32;
        let mut failed = 0u32;
        let outcome = self
            .process_rows(job_id, bulk_import_id, &user, rows, &token, &mut successful, &mut failed)
            .await;

        self.cancellations.lock().await.remove(&job_id);

        let (import_status, update) = match outcome {
            RunOutcome::Finished => (BulkImportStatus::Completed, Some(JobUpdate::Completed)),
            RunOutcome::Fatal(message) => {
                error!(job_id = %job_id, error = %message, "Bulk job failed");
                (BulkImportStatus::Failed, Some(JobUpdate::Failed { message }))
            }
            RunOutcome::Cancelled => {
                info!(job_id = %job_id, processed = successful + failed, "Bulk job cancelled");
                (BulkImportStatus::Failed, None)
            }
        };

        if let Err(e) = self
            .repository
            .finish_bulk_import(bulk_import_id, import_status, successful, failed)
            .await
        {
            warn!(
                job_id = %job_id,
                bulk_import_id = %bulk_import_id,
                error = %e,
                "Failed to record bulk import status"
            );
        }

        if let Some(update) = update {
            if let Some(job) = self.jobs.update(job_id, update).await {
                info!(
                    job_id = %job_id,
                    status = ?job.status,
                    successful_rows = job.successful_rows,
                    failed_rows = job.failed_rows,
                    "Bulk job finished"
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_rows(
        &self,
        job_id: Uuid,
        bulk_import_id: Uuid,
        user: &AuthUser,
        rows: Vec<CsvRow>,
        token: &CancellationToken,
        successful: &mut u32,
        failed: &mut u32,
    ) -> RunOutcome {
        for (row_index, row) in rows.into_iter().enumerate() {
            if token.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            // Removed from the store means nobody can observe the job any more
            if self.jobs.update(job_id, JobUpdate::Started { row_index }).await.is_none() {
                return RunOutcome::Cancelled;
            }

            let update = match self.process_row(bulk_import_id, user, row, token).await {
                RowOutcome::Saved => {
                    debug!(job_id = %job_id, row_index, "Bulk row saved");
                    *successful += 1;
                    JobUpdate::RowSucceeded { row_index }
                }
                RowOutcome::Failed(message) => {
                    warn!(job_id = %job_id, row_index, error = %message, "Bulk row failed");
                    *failed += 1;
                    JobUpdate::RowFailed { row_index, message }
                }
                RowOutcome::Fatal(message) => return RunOutcome::Fatal(message),
                RowOutcome::Cancelled => return RunOutcome::Cancelled,
            };
            self.jobs.update(job_id, update).await;
        }
        RunOutcome::Finished
    }

    async fn process_row(
        &self,
        bulk_import_id: Uuid,
        user: &AuthUser,
        row: CsvRow,
        token: &CancellationToken,
    ) -> RowOutcome {
        if let Some(issue) = row.issues().into_iter().next() {
            return RowOutcome::Failed(issue.message);
        }

        match self.quota.reserve(user, 1).await {
            Ok(_) => {}
            Err(QuotaError::Store(e)) => {
                return RowOutcome::Fatal(format!("Quota store unavailable: {}", e));
            }
            Err(e) => return RowOutcome::Failed(e.to_string()),
        }

        let generated = tokio::select! {
            _ = token.cancelled() => return RowOutcome::Cancelled,
            result = tokio::time::timeout(self.generation_timeout, self.generator.generate(&row)) => result,
        };

        let generated = match generated {
            Err(_) => {
                return RowOutcome::Failed(format!(
                    "Generation timed out after {}s",
                    self.generation_timeout.as_secs()
                ));
            }
            Ok(Err(e)) => return RowOutcome::Failed(format!("Generation failed: {}", e)),
            Ok(Ok(generated)) => generated,
        };

        if let Err(e) = generated.listing.validate() {
            return RowOutcome::Failed(format!("Invalid listing: {}", e));
        }

        let new = NewGeneration {
            user_id: user.user_id.clone(),
            bulk_import_id: Some(bulk_import_id),
            source: GenerationSource::Bulk,
            row,
            listing: generated.listing,
            tokens_used: generated.tokens_used,
        };

        match self.repository.save_generation(new).await {
            Ok(_) => RowOutcome::Saved,
            Err(e) => RowOutcome::Fatal(format!("Generation storage unavailable: {}", e)),
        }
    }
}
