use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One failed row; `row_index` is the 0-based position in the submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

/// Runner-side state transitions; the only way a job changes after insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Started { row_index: usize },
    RowSucceeded { row_index: usize },
    RowFailed { row_index: usize, message: String },
    Completed,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkJob {
    pub job_id: Uuid,
    pub owner_id: String,
    pub bulk_import_id: Uuid,
    pub status: JobStatus,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub successful_rows: usize,
    pub failed_rows: usize,
    #[serde(rename = "currentRow")]
    pub current_row_index: Option<usize>,
    pub errors: Vec<RowError>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub fatal_error: Option<String>,
    pub progress: u8,
}

impl BulkJob {
    pub fn new(owner_id: impl Into<String>, bulk_import_id: Uuid, total_rows: usize) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            bulk_import_id,
            status: JobStatus::Pending,
            total_rows,
            processed_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            current_row_index: None,
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            fatal_error: None,
            progress: 0,
        }
    }

    /// Apply one transition. Terminal jobs are immutable, so late updates are dropped
    /// and `false` is returned.
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        match update {
            JobUpdate::Started { row_index } => {
                self.status = JobStatus::Running;
                self.current_row_index = Some(row_index);
            }
            JobUpdate::RowSucceeded { row_index } => {
                self.status = JobStatus::Running;
                self.current_row_index = Some(row_index);
                self.processed_rows += 1;
                self.successful_rows += 1;
            }
            JobUpdate::RowFailed { row_index, message } => {
                self.status = JobStatus::Running;
                self.current_row_index = Some(row_index);
                self.processed_rows += 1;
                self.failed_rows += 1;
                self.errors.push(RowError { row_index, message });
            }
            JobUpdate::Completed => {
                self.status = JobStatus::Completed;
                self.completed_at = Some(now);
            }
            JobUpdate::Failed { message } => {
                self.status = JobStatus::Failed;
                self.fatal_error = Some(message);
                self.completed_at = Some(now);
            }
        }

        self.progress = self.progress_percent();
        true
    }

    pub fn progress_percent(&self) -> u8 {
        if self.total_rows == 0 {
            return if self.status.is_terminal() { 100 } else { 0 };
        }
        ((self.processed_rows * 100) / self.total_rows).min(100) as u8
    }

    /// Whether the job should be dropped from the store at `now`
    pub fn is_expired(
        &self,
        now: DateTime<Utc>,
        retention: std::time::Duration,
        stale_after: std::time::Duration,
    ) -> bool {
        // Negative ages (clock skew) count as zero
        let age = |since: DateTime<Utc>| (now - since).to_std().unwrap_or_default();

        match self.completed_at {
            Some(done) if self.status.is_terminal() => age(done) >= retention,
            _ => age(self.started_at) >= stale_after,
        }
    }
}
