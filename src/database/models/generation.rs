use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::csv_io::ExportRecord;
use crate::listing::{CsvRow, ListingOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Bulk,
    Single,
}

impl GenerationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSource::Bulk => "bulk",
            GenerationSource::Single => "single",
        }
    }
}

impl FromStr for GenerationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bulk" => Ok(GenerationSource::Bulk),
            "single" => Ok(GenerationSource::Single),
            other => Err(format!("unknown generation source '{}'", other)),
        }
    }
}

/// A generation about to be persisted
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub user_id: String,
    pub bulk_import_id: Option<Uuid>,
    pub source: GenerationSource,
    pub row: CsvRow,
    pub listing: ListingOutput,
    pub tokens_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub bulk_import_id: Option<Uuid>,
    pub source: GenerationSource,
    pub row: CsvRow,
    pub listing: ListingOutput,
    pub tokens_used: u32,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn from_new(new: NewGeneration, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            bulk_import_id: new.bulk_import_id,
            source: new.source,
            row: new.row,
            listing: new.listing,
            tokens_used: new.tokens_used,
            created_at,
        }
    }
}

impl From<&GenerationRecord> for ExportRecord {
    fn from(record: &GenerationRecord) -> Self {
        ExportRecord {
            product_name: record.row.product_name.clone(),
            niche: record.row.niche.clone(),
            audience: record.row.audience.clone(),
            keywords: record.row.keywords.clone(),
            tone: record.row.tone.clone(),
            title: record.listing.title.clone(),
            description: record.listing.description.clone(),
            tags: record.listing.tags.clone(),
            materials: record.listing.materials.clone(),
        }
    }
}

/// Export query filters; every bound is optional and inclusive
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub bulk_import_id: Option<Uuid>,
    pub source: Option<GenerationSource>,
}

impl ExportFilter {
    pub fn matches(&self, record: &GenerationRecord) -> bool {
        self.from.map_or(true, |from| record.created_at >= from)
            && self.to.map_or(true, |to| record.created_at <= to)
            && self.bulk_import_id.map_or(true, |id| record.bulk_import_id == Some(id))
            && self.source.map_or(true, |source| record.source == source)
    }
}
