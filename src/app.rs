use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Multipart framing overhead allowed on top of the file size limit
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(csv_routes(&state))
        .route("/api/quota", get(protected::quota_get))
        .route("/api/generate", post(protected::generate_post))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn csv_routes(state: &AppState) -> Router<AppState> {
    use protected::csv;

    let upload_limit = state.config.bulk.max_upload_bytes + MULTIPART_SLACK_BYTES;

    Router::new()
        .route(
            "/api/csv/upload",
            post(csv::upload_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/csv/process", post(csv::process_post))
        .route(
            "/api/csv/process/:job_id",
            get(csv::process_get).delete(csv::process_delete),
        )
        .route("/api/csv/export", get(csv::export_get))
        .route("/api/csv/template", get(csv::template_get))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}
