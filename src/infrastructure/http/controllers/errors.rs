use crate::context::AppState;
use crate::infrastructure::http::blueprint::Blueprint;
use crate::infrastructure::http::middleware::{
    error_response, ResponseFormat, INTERNAL_ERROR_MESSAGE,
};
use axum::{
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
    Router,
};
use std::any::Any;

/// Error pages. Contributes no routes: its handlers are installed as the
/// router fallback and the panic handler, and answer in JSON or HTML as the
/// request negotiated.
pub const BLUEPRINT: Blueprint = Blueprint::new("errors", routes);

fn routes() -> Router<AppState> {
    Router::new()
}

pub async fn not_found(uri: Uri, headers: HeaderMap) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "File Not Found",
        ResponseFormat::negotiate(uri.path(), &headers),
    )
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!("Exception on request: {}", detail);

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE,
        ResponseFormat::current(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT, CONTENT_TYPE};
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_not_found_negotiates_format() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let page = not_found(Uri::from_static("/missing"), headers).await;
        let api = not_found(Uri::from_static("/api/missing"), HeaderMap::new()).await;

        assert_eq!(page.status(), StatusCode::NOT_FOUND);
        assert!(page.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert_eq!(api.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_handle_panic_returns_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
