//! HTTP server wiring

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use testforge_common::Database;
use testforge_runner::{Executor, OpenAiGenerator, Pipeline};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

/// State shared by all handlers
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Open the store and build the pipeline. Fails when the completion
    /// service has no API key.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let generator = OpenAiGenerator::new(config.completion.clone())?;
        let db = Database::open(&config.db_path)?;
        let executor = Executor::new(config.executor.clone());

        Ok(Self::from_pipeline(Pipeline::new(db, Arc::new(generator), executor)))
    }

    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn db(&self) -> &Database {
        self.pipeline.database()
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .merge(crate::scripts::script_routes())
        .merge(crate::execution::execution_routes())
        .merge(crate::results::result_routes());

    Router::new()
        .nest("/api", api)
        .fallback(not_found_handler)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    info!(
        "TestForge API starting on http://{} (generator: {})",
        addr,
        state.pipeline.generator_name()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "testforge-web",
        "version": testforge_common::VERSION,
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}
