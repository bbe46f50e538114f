//! HTTP trigger surface

pub mod errors;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

pub use errors::{ApiError, ApiResult};
pub use handlers::AppState;

/// Build the axum router (separated from `serve` for testing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/sync/full", post(handlers::sync_full))
        .route("/sync/club", post(handlers::sync_club))
        .route("/sync/recent", post(handlers::sync_recent))
        .route("/sync/logs", get(handlers::sync_logs))
        .route("/staff/metrics", get(handlers::staff_metrics))
        .route("/insights/context", get(handlers::insight_context))
        .with_state(state)
}
