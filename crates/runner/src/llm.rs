//! Completion service client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use testforge_common::{Error, Result};
use tracing::{debug, warn};

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,

    /// Model identifier
    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// API key. Read from the environment, never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_key: None,
        }
    }
}

/// One generation request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
}

/// Something that turns a prompt into test source text
#[async_trait]
pub trait TestGenerator: Send + Sync {
    /// Returns the generated text verbatim. Fails with `Error::Generation`
    /// when the service errors or returns no content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    fn provider_name(&self) -> &'static str;
}

/// Client for the OpenAI chat completions API
pub struct OpenAiGenerator {
    config: CompletionConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidConfig("completion service API key is not set".to_string())
            })?;

        Ok(Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl TestGenerator for OpenAiGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        debug!("Requesting completion from {} ({})", self.endpoint(), self.config.model);

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("completion request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            warn!("Completion service returned status {}", status);
            return Err(Error::Generation(format!(
                "completion service returned {}: {}",
                status, error_text
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Generation(format!("invalid completion response: {}", e)))?;

        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .filter(|text| !text.is_empty())
            .map(String::from)
            .ok_or_else(|| Error::Generation("Failed to generate test code".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Option<serde_json::Value>>>;

    /// Serve `response` from a local stand-in and return its base URL.
    async fn stub_service(
        status: axum::http::StatusCode,
        response: serde_json::Value,
    ) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(seen): State<Captured>, Json(body): Json<serde_json::Value>| {
                        let response = response.clone();
                        async move {
                            *seen.lock().unwrap() = Some(body);
                            (status, Json(response))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1", addr), captured)
    }

    fn generator(api_base: String) -> OpenAiGenerator {
        OpenAiGenerator::new(CompletionConfig {
            api_base,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: Some("system text".to_string()),
            prompt: "write a test".to_string(),
        }
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = OpenAiGenerator::new(CompletionConfig::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let blank = CompletionConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(OpenAiGenerator::new(blank).is_err());
    }

    #[tokio::test]
    async fn test_returns_first_choice_verbatim() {
        let (base, captured) = stub_service(
            axum::http::StatusCode::OK,
            serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "describe('x', () => {});"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            }),
        )
        .await;

        let text = generator(base).complete(&request()).await.unwrap();
        assert_eq!(text, "describe('x', () => {});");

        let body = captured.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "write a test");
    }

    #[tokio::test]
    async fn test_empty_content_is_generation_failure() {
        let (base, _) = stub_service(
            axum::http::StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"content": ""}}]}),
        )
        .await;

        let err = generator(base).complete(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_generation_failure() {
        let (base, _) = stub_service(
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({"error": {"message": "rate limited"}}),
        )
        .await;

        let err = generator(base).complete(&request()).await.unwrap_err();
        match err {
            Error::Generation(msg) => assert!(msg.contains("rate limited")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_generation_failure() {
        let err = generator("http://127.0.0.1:1/v1".to_string())
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
