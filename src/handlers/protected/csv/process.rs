use std::collections::BTreeSet;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::jobs::BulkJob;
use crate::listing::CsvRow;
use crate::middleware::{ApiResponse, ApiResult};
use crate::quota::QuotaUsage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub rows: Vec<CsvRow>,
    /// 0-based indices into `rows`; all rows when absent
    #[serde(default)]
    pub selected_rows: Option<Vec<usize>>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAccepted {
    pub job_id: Uuid,
    pub bulk_import_id: Uuid,
    pub total_rows: usize,
    pub quota: QuotaUsage,
}

/// POST /api/csv/process - accept a batch of rows and start a bulk job
///
/// The whole selection is checked against remaining quota first; if it does not
/// fit, responds 402 and nothing is processed.
pub async fn start(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<ProcessAccepted> {
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let rows: Vec<CsvRow> = select_rows(request.rows, request.selected_rows)?
        .into_iter()
        .map(CsvRow::normalized)
        .collect();

    if rows.is_empty() {
        return Err(ApiError::bad_request("No rows selected"));
    }
    let max_rows = state.config.bulk.max_rows_per_job;
    if rows.len() > max_rows {
        return Err(ApiError::bad_request(format!(
            "At most {} rows can be processed per job (got {})",
            max_rows,
            rows.len()
        )));
    }

    let invalid: Vec<_> = rows
        .iter()
        .enumerate()
        .flat_map(|(index, row)| {
            row.issues().into_iter().map(move |issue| {
                json!({ "row": index + 1, "field": issue.field, "message": issue.message })
            })
        })
        .collect();
    if !invalid.is_empty() {
        return Err(ApiError::validation_error(
            "Selected rows failed validation",
            json!({ "validationErrors": invalid }),
        ));
    }

    let count = u32::try_from(rows.len()).unwrap_or(u32::MAX);
    let quota = state.quota.check(&user, count).await?;

    let import = state
        .generations
        .create_bulk_import(&user.user_id, request.file_name.as_deref(), count)
        .await?;
    let job = state.runner.start(user, rows, import.id).await;

    Ok(ApiResponse::accepted(ProcessAccepted {
        job_id: job.job_id,
        bulk_import_id: import.id,
        total_rows: job.total_rows,
        quota,
    }))
}

/// GET /api/csv/process/:job_id - poll job progress
///
/// Unknown, expired and other users' jobs all read as 404.
pub async fn progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> ApiResult<BulkJob> {
    let job = match Uuid::parse_str(&job_id) {
        Ok(id) => state.runner.get_progress(id).await,
        Err(_) => None,
    };

    match job {
        Some(job) if job.owner_id == user.user_id => Ok(ApiResponse::success(job)),
        _ => Err(ApiError::not_found("Job not found or expired")),
    }
}

/// DELETE /api/csv/process/:job_id - drop a job and stop it before its next row
///
/// Always succeeds; jobs owned by someone else are left untouched.
pub async fn cleanup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    if let Ok(id) = Uuid::parse_str(&job_id) {
        let owned = state
            .runner
            .get_progress(id)
            .await
            .map_or(true, |job| job.owner_id == user.user_id);
        if owned {
            state.runner.cleanup(id).await;
        }
    }

    Ok(ApiResponse::success(json!({ "jobId": job_id })))
}

/// Apply an optional selection, keeping input order and dropping duplicate indices
fn select_rows(rows: Vec<CsvRow>, selected: Option<Vec<usize>>) -> Result<Vec<CsvRow>, ApiError> {
    let Some(selected) = selected else {
        return Ok(rows);
    };

    let wanted: BTreeSet<usize> = selected.into_iter().collect();
    if let Some(&bad) = wanted.iter().find(|&&i| i >= rows.len()) {
        return Err(ApiError::bad_request(format!(
            "Selected row {} is out of range (batch has {} rows)",
            bad,
            rows.len()
        )));
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .filter(|(index, _)| wanted.contains(index))
        .map(|(_, row)| row)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> CsvRow {
        CsvRow {
            product_name: name.into(),
            niche: None,
            audience: None,
            keywords: vec!["k".into()],
            tone: None,
        }
    }

    #[test]
    fn selection_keeps_input_order() {
        let rows = vec![row("a"), row("b"), row("c")];
        let picked = select_rows(rows, Some(vec![2, 0, 2])).unwrap();
        let names: Vec<_> = picked.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        assert!(select_rows(vec![row("a")], Some(vec![1])).is_err());
        assert_eq!(select_rows(vec![row("a")], None).unwrap().len(), 1);
    }
}
