use crate::context::AppState;
use crate::infrastructure::http::blueprint::{Blueprint, Endpoint};
use crate::infrastructure::http::middleware::ApiResult;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

const ENDPOINTS: &[Endpoint] = &[
    Endpoint::new("ping", "/ping"),
    Endpoint::new("status", "/status"),
    Endpoint::new("health", "/health"),
];

pub const BLUEPRINT: Blueprint = Blueprint::new("api", routes).with_endpoints(ENDPOINTS);

fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/status", get(status))
        .route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub search_enabled: bool,
    pub task_queue: String,
    pub queued_tasks: Option<usize>,
    pub languages: Vec<String>,
    pub blueprints: Vec<&'static str>,
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let queued_tasks = match state.task_queue.len().await {
        Ok(len) => Some(len),
        Err(e) => {
            tracing::warn!("Task queue {} unavailable: {}", state.task_queue.name(), e);
            None
        }
    };

    Json(StatusResponse {
        search_enabled: state.search_enabled(),
        task_queue: state.task_queue.name().to_string(),
        queued_tasks,
        languages: state.babel.languages().to_vec(),
        blueprints: state.routes.names(),
    })
}

/// Checks the cache store and, when configured, the search service.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.redis.ping().await?;

    let search = match &state.search {
        Some(client) => Some(client.ping().await?),
        None => None,
    };

    Ok(Json(json!({
        "status": "ok",
        "cache": true,
        "search": search,
    })))
}
