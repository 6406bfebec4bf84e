use axum::{extract::State, Extension};

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::quota::QuotaUsage;
use crate::state::AppState;

/// GET /api/quota - current month's usage for the caller
pub async fn quota_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<QuotaUsage> {
    let usage = state.quota.current_usage(&user).await?;
    Ok(ApiResponse::success(usage))
}
