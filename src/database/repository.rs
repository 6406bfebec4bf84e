use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{BulkImport, BulkImportStatus, ExportFilter, GenerationRecord, NewGeneration};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for bulk imports and generated listings
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    async fn create_bulk_import(
        &self,
        user_id: &str,
        file_name: Option<&str>,
        total_rows: u32,
    ) -> Result<BulkImport, RepositoryError>;

    async fn finish_bulk_import(
        &self,
        id: Uuid,
        status: BulkImportStatus,
        successful_rows: u32,
        failed_rows: u32,
    ) -> Result<(), RepositoryError>;

    async fn save_generation(&self, new: NewGeneration) -> Result<GenerationRecord, RepositoryError>;

    /// The user's generations matching `filter`, oldest first
    async fn list_generations(
        &self,
        user_id: &str,
        filter: &ExportFilter,
    ) -> Result<Vec<GenerationRecord>, RepositoryError>;
}

/// Process-local repository used in development and tests
#[derive(Debug, Default)]
pub struct MemoryGenerationRepository {
    imports: RwLock<Vec<BulkImport>>,
    generations: RwLock<Vec<GenerationRecord>>,
}

impl MemoryGenerationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bulk_import(&self, id: Uuid) -> Option<BulkImport> {
        self.imports.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn generation_count(&self) -> usize {
        self.generations.read().await.len()
    }
}

#[async_trait]
impl GenerationRepository for MemoryGenerationRepository {
    async fn create_bulk_import(
        &self,
        user_id: &str,
        file_name: Option<&str>,
        total_rows: u32,
    ) -> Result<BulkImport, RepositoryError> {
        let import = BulkImport {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            file_name: file_name.map(str::to_string),
            total_rows,
            status: BulkImportStatus::Processing,
            successful_rows: 0,
            failed_rows: 0,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.imports.write().await.push(import.clone());
        Ok(import)
    }

    async fn finish_bulk_import(
        &self,
        id: Uuid,
        status: BulkImportStatus,
        successful_rows: u32,
        failed_rows: u32,
    ) -> Result<(), RepositoryError> {
        let mut imports = self.imports.write().await;
        let import = imports
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("bulk import {}", id)))?;

        import.status = status;
        import.successful_rows = successful_rows;
        import.failed_rows = failed_rows;
        import.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn save_generation(&self, new: NewGeneration) -> Result<GenerationRecord, RepositoryError> {
        let record = GenerationRecord::from_new(new, Uuid::new_v4(), Utc::now());
        self.generations.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_generations(
        &self,
        user_id: &str,
        filter: &ExportFilter,
    ) -> Result<Vec<GenerationRecord>, RepositoryError> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .filter(|g| g.user_id == user_id && filter.matches(g))
            .cloned()
            .collect())
    }
}
