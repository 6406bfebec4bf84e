use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::listing::{CsvRow, ListingOutput};

use super::models::{BulkImport, BulkImportStatus, ExportFilter, GenerationRecord, NewGeneration};
use super::repository::{GenerationRepository, RepositoryError};

#[derive(Clone)]
pub struct PgGenerationRepository {
    pool: PgPool,
}

impl PgGenerationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BulkImportRow {
    id: Uuid,
    user_id: String,
    file_name: Option<String>,
    total_rows: i32,
    status: String,
    successful_rows: i32,
    failed_rows: i32,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<BulkImportRow> for BulkImport {
    type Error = RepositoryError;

    fn try_from(row: BulkImportRow) -> Result<Self, Self::Error> {
        Ok(BulkImport {
            id: row.id,
            user_id: row.user_id,
            file_name: row.file_name,
            total_rows: row.total_rows.max(0) as u32,
            status: row.status.parse().map_err(RepositoryError::Corrupt)?,
            successful_rows: row.successful_rows.max(0) as u32,
            failed_rows: row.failed_rows.max(0) as u32,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct GenerationRow {
    id: Uuid,
    user_id: String,
    bulk_import_id: Option<Uuid>,
    source: String,
    product_name: String,
    niche: Option<String>,
    audience: Option<String>,
    keywords: Vec<String>,
    tone: Option<String>,
    title: String,
    description: String,
    tags: Vec<String>,
    materials: Vec<String>,
    extras: Value,
    tokens_used: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<GenerationRow> for GenerationRecord {
    type Error = RepositoryError;

    fn try_from(row: GenerationRow) -> Result<Self, Self::Error> {
        let alt_texts = row
            .extras
            .get("altTexts")
            .cloned()
            .map(serde_json::from_value::<Vec<String>>)
            .transpose()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?
            .unwrap_or_default();
        let price = row.extras.get("price").and_then(Value::as_f64);
        let extras = match row.extras.get("extras") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        Ok(GenerationRecord {
            id: row.id,
            user_id: row.user_id,
            bulk_import_id: row.bulk_import_id,
            source: row.source.parse().map_err(RepositoryError::Corrupt)?,
            row: CsvRow {
                product_name: row.product_name,
                niche: row.niche,
                audience: row.audience,
                keywords: row.keywords,
                tone: row.tone,
            },
            listing: ListingOutput {
                title: row.title,
                description: row.description,
                tags: row.tags,
                materials: row.materials,
                alt_texts,
                price,
                extras,
            },
            tokens_used: row.tokens_used.max(0) as u32,
            created_at: row.created_at,
        })
    }
}

const GENERATION_COLUMNS: &str = "id, user_id, bulk_import_id, source, product_name, niche, audience, \
     keywords, tone, title, description, tags, materials, extras, tokens_used, created_at";

#[async_trait]
impl GenerationRepository for PgGenerationRepository {
    async fn create_bulk_import(
        &self,
        user_id: &str,
        file_name: Option<&str>,
        total_rows: u32,
    ) -> Result<BulkImport, RepositoryError> {
        let row: BulkImportRow = sqlx::query_as(
            r#"
            INSERT INTO bulk_imports (id, user_id, file_name, total_rows, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, file_name, total_rows, status, successful_rows,
                      failed_rows, created_at, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(file_name)
        .bind(i32::try_from(total_rows).unwrap_or(i32::MAX))
        .bind(BulkImportStatus::Processing.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn finish_bulk_import(
        &self,
        id: Uuid,
        status: BulkImportStatus,
        successful_rows: u32,
        failed_rows: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE bulk_imports
            SET status = $2, successful_rows = $3, failed_rows = $4, completed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(i32::try_from(successful_rows).unwrap_or(i32::MAX))
        .bind(i32::try_from(failed_rows).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("bulk import {}", id)));
        }
        Ok(())
    }

    async fn save_generation(&self, new: NewGeneration) -> Result<GenerationRecord, RepositoryError> {
        let id = Uuid::new_v4();
        let extras = json!({
            "altTexts": new.listing.alt_texts,
            "price": new.listing.price,
            "extras": new.listing.extras,
        });

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO generations (
                id, user_id, bulk_import_id, source, product_name, niche, audience, keywords,
                tone, title, description, tags, materials, extras, tokens_used
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(&new.user_id)
        .bind(new.bulk_import_id)
        .bind(new.source.as_str())
        .bind(&new.row.product_name)
        .bind(&new.row.niche)
        .bind(&new.row.audience)
        .bind(&new.row.keywords)
        .bind(&new.row.tone)
        .bind(&new.listing.title)
        .bind(&new.listing.description)
        .bind(&new.listing.tags)
        .bind(&new.listing.materials)
        .bind(&extras)
        .bind(i32::try_from(new.tokens_used).unwrap_or(i32::MAX))
        .fetch_one(&self.pool)
        .await?;

        Ok(GenerationRecord::from_new(new, id, created_at))
    }

    async fn list_generations(
        &self,
        user_id: &str,
        filter: &ExportFilter,
    ) -> Result<Vec<GenerationRecord>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {GENERATION_COLUMNS}
            FROM generations
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::uuid IS NULL OR bulk_import_id = $4)
              AND ($5::text IS NULL OR source = $5)
            ORDER BY created_at, id
            "#
        );

        let rows: Vec<GenerationRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.bulk_import_id)
            .bind(filter.source.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(GenerationRecord::try_from).collect()
    }
}
