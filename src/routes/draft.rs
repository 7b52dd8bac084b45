use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::services::coordinator::Coordinator;

/**
 * GET the current draft state.
 */
pub async fn get_state(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    let cloned_state = coordinator.current_state().await;

    (StatusCode::OK, Json(cloned_state)).into_response()
}

/**
 * POST to make sure the coordinator is up. Safe to call any number of times.
 */
pub async fn ensure_coordinator(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    let status = coordinator.status().await;
    info!("Coordinator check: {:?}", status.phase);

    (StatusCode::OK, Json(status))
}
