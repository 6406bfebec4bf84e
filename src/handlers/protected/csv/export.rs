use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use tracing::info;

use crate::auth::AuthUser;
use crate::csv_io::{template_csv, to_csv, ExportRecord};
use crate::database::models::ExportFilter;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/csv/export - the caller's generations as a CSV attachment
///
/// Query: `from`, `to` (RFC 3339, inclusive), `bulkImportId`, `source` (`bulk` | `single`).
pub async fn export(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ExportFilter>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(filter) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let generations = state.generations.list_generations(&user.user_id, &filter).await?;
    let records: Vec<ExportRecord> = generations.iter().map(ExportRecord::from).collect();
    let body = to_csv(&records)?;

    info!(user_id = %user.user_id, rows = records.len(), "CSV export generated");

    let file_name = format!("listings-{}.csv", Utc::now().format("%Y%m%d-%H%M%S"));
    Ok(csv_attachment(body, &file_name))
}

/// GET /api/csv/template - header row plus one example row
pub async fn template() -> Result<Response, ApiError> {
    let body = template_csv()?;
    Ok(csv_attachment(body, "listing-template.csv"))
}

fn csv_attachment(body: String, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}
