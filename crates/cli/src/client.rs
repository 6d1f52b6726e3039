//! TestForge API client

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use testforge_common::{ExecutionResult, GeneratedScript, ResolvedResult, ResultStats, RunReport};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    details: Option<String>,
}

/// Client for the TestForge HTTP API
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// `server` is the server root, e.g. `http://127.0.0.1:5000`
    pub fn new(server: &str) -> Self {
        Self {
            base: format!("{}/api", server.trim_end_matches('/')),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error,
                details: Some(details),
            }) => bail!("{} ({}): {}", error, status, details),
            Ok(ErrorBody { error, .. }) => bail!("{} ({})", error, status),
            Err(_) => bail!("server returned {}: {}", status, text),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", self.url(path));
        let resp = self.http.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        debug!("POST {}", self.url(path));
        let resp = self.http.post(self.url(path)).json(&body).send().await?;
        Self::decode(resp).await
    }

    /// Check if the server is healthy
    pub async fn health_check(&self) -> bool {
        self.get::<serde_json::Value>("/health")
            .await
            .map(|v| v["status"] == "ok")
            .unwrap_or(false)
    }

    pub async fn list_scripts(&self) -> Result<Vec<GeneratedScript>> {
        self.get("/test-scripts").await
    }

    pub async fn get_script(&self, id: &str) -> Result<GeneratedScript> {
        self.get(&format!("/test-scripts/{}", id)).await
    }

    pub async fn generate_script(&self, url: &str, language: &str) -> Result<GeneratedScript> {
        self.post(
            "/test-scripts/generate",
            json!({"url": url, "language": language}),
        )
        .await
    }

    pub async fn generate_and_run(
        &self,
        url: &str,
        language: &str,
        test_type: &str,
        framework: Option<&str>,
    ) -> Result<RunReport> {
        self.post(
            "/test-execution/generate-and-run",
            json!({
                "url": url,
                "language": language,
                "testType": test_type,
                "framework": framework,
            }),
        )
        .await
    }

    pub async fn run_script(
        &self,
        id: &str,
        test_type: &str,
        framework: Option<&str>,
    ) -> Result<ExecutionResult> {
        self.post(
            &format!("/test-execution/run/{}", id),
            json!({"testType": test_type, "framework": framework}),
        )
        .await
    }

    /// All results, or only those of `script_id`
    pub async fn list_results(&self, script_id: Option<&str>) -> Result<Vec<ResolvedResult>> {
        match script_id {
            Some(id) => self.get(&format!("/test-results/script/{}", id)).await,
            None => self.get("/test-results").await,
        }
    }

    pub async fn stats(&self) -> Result<ResultStats> {
        self.get("/test-results/stats").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use testforge_common::{Language, TestKind, TestStatus};

    async fn stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_decodes_stats() {
        let app = Router::new().route(
            "/api/test-results/stats",
            get(|| async {
                Json(json!({
                    "total": 3, "passed": 2, "failed": 1,
                    "unitTests": {"total": 3, "passed": 2, "failed": 1},
                    "regressionTests": {"total": 0, "passed": 0, "failed": 0},
                    "averageExecutionTime": 0.0
                }))
            }),
        );
        let client = ApiClient::new(&stub(app).await);

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.unit_tests.passed, 2);
    }

    #[tokio::test]
    async fn test_surfaces_server_error_message() {
        let app = Router::new().route(
            "/api/test-scripts/:id",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "Test script not found"})),
                )
            }),
        );
        let client = ApiClient::new(&stub(app).await);

        let err = client.get_script("missing").await.unwrap_err();
        assert!(err.to_string().contains("Test script not found"));
    }

    #[tokio::test]
    async fn test_decodes_generate_and_run_report() {
        let script = GeneratedScript::new(
            "REGRESSION Test for https://example.com".to_string(),
            "Generated javascript test for https://example.com".to_string(),
            Language::JavaScript,
            "it()".to_string(),
        );
        let report = RunReport {
            test_result: ExecutionResult::new(
                script.id.clone(),
                TestStatus::Fail,
                TestKind::Regression,
                "{}".to_string(),
                Some("1 failing".to_string()),
            ),
            test_script: script,
        };
        let body = report.clone();
        let app = Router::new().route(
            "/api/test-execution/generate-and-run",
            post(move || async move { Json(body) }),
        );
        let client = ApiClient::new(&stub(app).await);

        let decoded = client
            .generate_and_run("https://example.com", "javascript", "regression", None)
            .await
            .unwrap();
        assert_eq!(decoded, report);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:1");
        assert!(!client.health_check().await);
    }
}
