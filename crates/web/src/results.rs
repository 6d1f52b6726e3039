//! `/test-results` routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use testforge_common::{ResolvedResult, ResultStats};

use crate::error::ApiError;
use crate::server::SharedState;

pub fn result_routes() -> Router<SharedState> {
    Router::new()
        .route("/test-results", get(list_results))
        .route("/test-results/stats", get(result_stats))
        .route("/test-results/script/:script_id", get(results_for_script))
}

async fn list_results(State(state): State<SharedState>) -> Result<Json<Vec<ResolvedResult>>, ApiError> {
    state
        .db()
        .list_results()
        .map(Json)
        .map_err(|e| ApiError::from_error(e, "Failed to fetch test results"))
}

async fn result_stats(State(state): State<SharedState>) -> Result<Json<ResultStats>, ApiError> {
    state
        .db()
        .result_stats()
        .map(Json)
        .map_err(|e| ApiError::from_error(e, "Failed to fetch test result statistics"))
}

async fn results_for_script(
    State(state): State<SharedState>,
    Path(script_id): Path<String>,
) -> Result<Json<Vec<ResolvedResult>>, ApiError> {
    state
        .db()
        .list_results_for_script(&script_id)
        .map(Json)
        .map_err(|e| ApiError::from_error(e, "Failed to fetch test results"))
}
