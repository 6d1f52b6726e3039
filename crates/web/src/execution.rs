//! `/test-execution` routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use testforge_common::{ExecutionResult, Framework, Language, RunReport, TestKind};
use testforge_runner::{GenerateAndRunRequest, RunRequest};

use crate::error::ApiError;
use crate::scripts::non_empty;
use crate::server::SharedState;

/// Extra fields sent by clients (viewport, aiFeatures, ...) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAndRunBody {
    url: Option<String>,
    language: Option<String>,
    test_type: Option<String>,
    framework: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunBody {
    test_type: Option<String>,
    framework: Option<String>,
}

pub fn execution_routes() -> Router<SharedState> {
    Router::new()
        .route("/test-execution/generate-and-run", post(generate_and_run))
        .route("/test-execution/run/:id", post(run_script))
}

fn parse_framework(value: Option<String>, context: &str) -> Result<Framework, ApiError> {
    match non_empty(value) {
        Some(v) => v.parse().map_err(|e| ApiError::from_error(e, context)),
        None => Ok(Framework::default()),
    }
}

async fn generate_and_run(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateAndRunBody>, JsonRejection>,
) -> Result<Json<RunReport>, ApiError> {
    const CONTEXT: &str = "Failed to generate and run test";

    let Json(body) = payload?;
    let (Some(url), Some(language), Some(test_type)) = (
        non_empty(body.url),
        non_empty(body.language),
        non_empty(body.test_type),
    ) else {
        return Err(ApiError::missing_parameters());
    };

    let request = GenerateAndRunRequest {
        url,
        language: language
            .parse::<Language>()
            .map_err(|e| ApiError::from_error(e, CONTEXT))?,
        test_type: test_type
            .parse::<TestKind>()
            .map_err(|e| ApiError::from_error(e, CONTEXT))?,
        framework: parse_framework(body.framework, CONTEXT)?,
    };

    let pipeline = state.pipeline.clone();
    let report = tokio::spawn(async move { pipeline.generate_and_run(&request).await })
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?
        .map_err(|e| ApiError::from_error(e, CONTEXT))?;

    Ok(Json(report))
}

async fn run_script(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<RunBody>, JsonRejection>,
) -> Result<Json<ExecutionResult>, ApiError> {
    const CONTEXT: &str = "Failed to execute test";

    let Json(body) = payload?;
    let Some(test_type) = non_empty(body.test_type) else {
        return Err(ApiError::missing_parameters());
    };

    let request = RunRequest {
        script_id: id,
        test_type: test_type
            .parse::<TestKind>()
            .map_err(|e| ApiError::from_error(e, CONTEXT))?,
        framework: parse_framework(body.framework, CONTEXT)?,
    };

    let pipeline = state.pipeline.clone();
    let result = tokio::spawn(async move { pipeline.run_existing(&request).await })
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?
        .map_err(|e| ApiError::from_error(e, CONTEXT))?;

    Ok(Json(result))
}
