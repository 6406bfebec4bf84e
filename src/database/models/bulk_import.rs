use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkImportStatus {
    Processing,
    Completed,
    Failed,
}

impl BulkImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkImportStatus::Processing => "processing",
            BulkImportStatus::Completed => "completed",
            BulkImportStatus::Failed => "failed",
        }
    }
}

impl FromStr for BulkImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(BulkImportStatus::Processing),
            "completed" => Ok(BulkImportStatus::Completed),
            "failed" => Ok(BulkImportStatus::Failed),
            other => Err(format!("unknown bulk import status '{}'", other)),
        }
    }
}

/// Durable record of one accepted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImport {
    pub id: Uuid,
    pub user_id: String,
    pub file_name: Option<String>,
    pub total_rows: u32,
    pub status: BulkImportStatus,
    pub successful_rows: u32,
    pub failed_rows: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
