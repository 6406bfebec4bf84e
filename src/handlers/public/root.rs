use axum::Json;
use serde_json::{json, Value};

/// GET / - service info
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Listing Bulk API",
            "version": version,
            "description": "Bulk CSV listing generation with per-user monthly quota",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "csv": "/api/csv/upload, /api/csv/process[/:job_id], /api/csv/export, /api/csv/template (protected)",
                "generate": "/api/generate (protected)",
                "quota": "/api/quota (protected)",
            }
        }
    }))
}
