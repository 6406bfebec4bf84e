//! Bulk generation jobs: in-memory progress records, the runner that drives them,
//! and the reaper that evicts them.

pub mod model;
pub mod reaper;
pub mod runner;
pub mod store;

pub use model::{BulkJob, JobStatus, JobUpdate, RowError};
pub use reaper::JobReaper;
pub use runner::BulkJobRunner;
pub use store::{JobStore, MemoryJobStore};
