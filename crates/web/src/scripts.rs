//! `/test-scripts` routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use testforge_common::{GeneratedScript, Language};
use testforge_runner::GenerateRequest;

use crate::error::ApiError;
use crate::server::SharedState;

#[derive(Debug, Deserialize)]
struct GenerateBody {
    url: Option<String>,
    language: Option<String>,
}

pub fn script_routes() -> Router<SharedState> {
    Router::new()
        .route("/test-scripts", get(list_scripts))
        .route("/test-scripts/generate", post(generate_script))
        .route("/test-scripts/:id", get(get_script))
}

async fn generate_script(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GeneratedScript>, ApiError> {
    const CONTEXT: &str = "Failed to generate test script";

    let Json(body) = payload?;
    let (Some(url), Some(language)) = (non_empty(body.url), non_empty(body.language)) else {
        return Err(ApiError::missing_parameters());
    };
    let request = GenerateRequest {
        url,
        language: language
            .parse::<Language>()
            .map_err(|e| ApiError::from_error(e, CONTEXT))?,
    };

    // Detached so a client disconnect does not cancel generation
    let pipeline = state.pipeline.clone();
    let script = tokio::spawn(async move { pipeline.generate_script(&request).await })
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?
        .map_err(|e| ApiError::from_error(e, CONTEXT))?;

    Ok(Json(script))
}

async fn list_scripts(State(state): State<SharedState>) -> Result<Json<Vec<GeneratedScript>>, ApiError> {
    state
        .db()
        .list_scripts()
        .map(Json)
        .map_err(|e| ApiError::from_error(e, "Failed to fetch test scripts"))
}

async fn get_script(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GeneratedScript>, ApiError> {
    state
        .db()
        .get_script(&id)
        .map_err(|e| ApiError::from_error(e, "Failed to fetch test script"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Test script not found"))
}

/// Treat absent and blank strings alike
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
