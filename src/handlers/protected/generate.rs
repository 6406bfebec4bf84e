use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::auth::AuthUser;
use crate::database::models::{GenerationRecord, GenerationSource, NewGeneration};
use crate::error::ApiError;
use crate::listing::CsvRow;
use crate::middleware::{ApiResponse, ApiResult};
use crate::quota::Reservation;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generation: GenerationRecord,
    pub quota: Reservation,
}

/// POST /api/generate - generate one listing outside of a bulk job
///
/// Shares the monthly counter with bulk jobs; the unit is consumed even when the
/// generation engine fails.
pub async fn generate_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CsvRow>, JsonRejection>,
) -> ApiResult<GenerateResponse> {
    let Json(row) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let row = row.normalized();

    let issues = row.issues();
    if !issues.is_empty() {
        return Err(ApiError::validation_error(
            "Invalid product row",
            json!({ "validationErrors": issues }),
        ));
    }

    let reservation = state.quota.reserve(&user, 1).await?;

    let timeout = state.config.bulk.generation_timeout();
    let generated = tokio::time::timeout(timeout, state.generator.generate(&row))
        .await
        .map_err(|_| {
            ApiError::bad_gateway(format!("Listing generation timed out after {}s", timeout.as_secs()))
        })??;
    generated
        .listing
        .validate()
        .map_err(|e| ApiError::bad_gateway(format!("Generation engine returned an invalid listing: {}", e)))?;

    let generation = state
        .generations
        .save_generation(NewGeneration {
            user_id: user.user_id.clone(),
            bulk_import_id: None,
            source: GenerationSource::Single,
            row,
            listing: generated.listing,
            tokens_used: generated.tokens_used,
        })
        .await?;

    info!(
        user_id = %user.user_id,
        generation_id = %generation.id,
        tokens_used = generation.tokens_used,
        "Single listing generated"
    );

    Ok(ApiResponse::success(GenerateResponse {
        generation,
        quota: reservation,
    }))
}
