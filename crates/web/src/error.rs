//! HTTP error responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use testforge_common::Error;
use tracing::error;

/// Error returned by a route handler, rendered as `{error, details?}`
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            details: None,
        }
    }

    pub fn missing_parameters() -> Self {
        Self::bad_request("Missing required parameters")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
            details: None,
        }
    }

    /// 500 with `context` as the error and `cause` as details
    pub fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, cause);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: context.to_string(),
            details: Some(cause.to_string()),
        }
    }

    /// Map a pipeline error; `context` names the failed operation for 500s
    pub fn from_error(err: Error, context: &str) -> Self {
        match err {
            Error::Validation(message) => Self::bad_request(message),
            Error::NotFound { kind, .. } => Self::not_found(format!("{} not found", capitalize(&kind))),
            other => Self::internal(context, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.error,
            details: self.details.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err = ApiError::from_error(Error::not_found("test script", "abc"), "Failed");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Test script not found");

        let err = ApiError::from_error(Error::Validation("bad language".into()), "Failed");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from_error(
            Error::Generation("Failed to generate test code".into()),
            "Failed to generate and run test",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to generate and run test");
        assert_eq!(
            err.details.as_deref(),
            Some("Generation failed: Failed to generate test code")
        );

        let err = ApiError::from_error(
            Error::UnsupportedLanguage("python".into()),
            "Failed to run test",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details.as_deref(), Some("Unsupported language: python"));
    }
}
