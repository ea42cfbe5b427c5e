use axum::{
    extract::Request,
    http::{header::ACCEPT, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::domain::ports::task_queue::QueueError;
use crate::infrastructure::providers::{CacheError, SearchError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(msg) => {
                // Reaches the failure-report sinks
                tracing::error!("Internal error while serving request: {}", msg);
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        };

        error_response(status, &message, ResponseFormat::current())
    }
}

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error has occurred";

/// Body format for error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

tokio::task_local! {
    static RESPONSE_FORMAT: ResponseFormat;
}

impl ResponseFormat {
    /// JSON for API paths and for clients that prefer JSON over HTML.
    pub fn negotiate(path: &str, headers: &HeaderMap) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            return ResponseFormat::Json;
        }

        let accept = match headers.get(ACCEPT).and_then(|v| v.to_str().ok()) {
            Some(accept) => accept,
            None => return ResponseFormat::Html,
        };
        let position = |mime: &str| {
            accept
                .split(',')
                .position(|item| item.split(';').next().map(str::trim) == Some(mime))
        };

        match (position("application/json"), position("text/html")) {
            (Some(json), Some(html)) if json < html => ResponseFormat::Json,
            (Some(_), None) => ResponseFormat::Json,
            _ => ResponseFormat::Html,
        }
    }

    /// Format negotiated for the request being served. JSON outside a
    /// request.
    pub fn current() -> Self {
        RESPONSE_FORMAT
            .try_with(|format| *format)
            .unwrap_or(ResponseFormat::Json)
    }
}

/// Records the error format for the request so that handlers, error
/// conversions and the panic handler can answer in it.
pub async fn negotiate_response_format(request: Request, next: Next) -> Response {
    let format = ResponseFormat::negotiate(request.uri().path(), request.headers());
    RESPONSE_FORMAT.scope(format, next.run(request)).await
}

pub fn error_response(status: StatusCode, message: &str, format: ResponseFormat) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");

    match format {
        ResponseFormat::Json => {
            (status, Json(json!({ "error": reason, "message": message }))).into_response()
        }
        ResponseFormat::Html => {
            let page = format!(
                "<!doctype html>\n<html><head><title>Microblog</title></head>\
                 <body><h1>{}</h1><p><a href=\"/\">Back</a></p></body></html>",
                message
            );
            (status, Html(page)).into_response()
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Backend(e) => ApiError::ServiceUnavailable(format!("Task queue: {}", e)),
            QueueError::Serialization(e) => ApiError::BadRequest(format!("Invalid payload: {}", e)),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = ApiError::Internal("secret stack".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, axum::http::HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_api_paths_get_json() {
        assert_eq!(ResponseFormat::negotiate("/api/status", &HeaderMap::new()), ResponseFormat::Json);
        assert_eq!(ResponseFormat::negotiate("/api", &accept("text/html")), ResponseFormat::Json);
        assert_eq!(ResponseFormat::negotiate("/apiary", &HeaderMap::new()), ResponseFormat::Html);
    }

    #[test]
    fn test_accept_header_preference() {
        assert_eq!(
            ResponseFormat::negotiate("/index", &accept("application/json")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::negotiate("/index", &accept("application/json, text/html;q=0.9")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::negotiate(
                "/index",
                &accept("text/html,application/xhtml+xml,application/json")
            ),
            ResponseFormat::Html
        );
        assert_eq!(ResponseFormat::negotiate("/index", &HeaderMap::new()), ResponseFormat::Html);
    }

    #[tokio::test]
    async fn test_internal_error_follows_request_format() {
        let response = RESPONSE_FORMAT
            .scope(ResponseFormat::Html, async {
                ApiError::Internal("disk full".into()).into_response()
            })
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }
}
