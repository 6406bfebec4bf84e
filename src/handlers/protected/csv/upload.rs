use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension,
};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::auth::AuthUser;
use crate::csv_io::{check_upload, parse, ColumnMapping, RowValidationError};
use crate::error::ApiError;
use crate::listing::CsvRow;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    /// Hex SHA-256 of the uploaded bytes
    pub file_hash: String,
    pub headers: Vec<String>,
    /// First few ready rows for display
    pub rows: Vec<CsvRow>,
    /// Every ready row, to be posted back to /api/csv/process
    pub records: Vec<CsvRow>,
    pub total_rows: usize,
    pub ready_rows: usize,
    pub column_mapping: ColumnMapping,
    pub validation_errors: Vec<RowValidationError>,
}

/// POST /api/csv/upload - parse an uploaded CSV and report which rows are ready
///
/// Multipart fields: `file` (required, .csv) and `columnMapping` (optional JSON
/// object overriding header auto-detection). Responds 400 with `needsMapping: true`
/// when a required column cannot be mapped.
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut mapping: Option<ColumnMapping> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("columnMapping") => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let parsed = serde_json::from_str::<ColumnMapping>(&text)
                        .map_err(|e| ApiError::invalid_json(format!("Invalid columnMapping: {}", e)))?;
                    mapping = Some(parsed);
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let text = check_upload(&file_name, &bytes, state.config.bulk.max_upload_bytes)?;
    let parsed = parse(text, mapping.as_ref())?;
    let file_hash = hex_digest(&bytes);

    if parsed.needs_mapping() {
        return Err(ApiError::validation_error(
            "Required columns could not be mapped",
            json!({
                "needsMapping": true,
                "headers": parsed.headers,
                "columnMapping": parsed.column_mapping,
                "missingColumns": parsed.missing_columns,
            }),
        ));
    }

    info!(
        user_id = %user.user_id,
        file_name = %file_name,
        file_hash = %file_hash,
        total_rows = parsed.total_rows,
        ready_rows = parsed.rows.len(),
        "CSV upload parsed"
    );

    Ok(ApiResponse::success(UploadResponse {
        file_name,
        file_hash,
        headers: parsed.headers,
        rows: parsed.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        ready_rows: parsed.rows.len(),
        records: parsed.rows,
        total_rows: parsed.total_rows,
        column_mapping: parsed.column_mapping,
        validation_errors: parsed.validation_errors,
    }))
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the maximum file size")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}
