use crate::context::AppState;
use crate::infrastructure::http::blueprint::{Blueprint, Endpoint};
use crate::infrastructure::http::middleware::{ApiError, Locale};
use axum::{
    extract::{OriginalUri, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

const ENDPOINTS: &[Endpoint] = &[Endpoint::new("index", "/"), Endpoint::new("index", "/index")];

pub const BLUEPRINT: Blueprint = Blueprint::new("main", routes).with_endpoints(ENDPOINTS);

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/index", get(index))
}

/// Home page. There are no user sessions, so every visitor is sent to the
/// login view.
pub async fn index(
    State(state): State<AppState>,
    Locale(locale): Locale,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let redirect = state
        .login
        .unauthorized(&state.routes, &state.babel, &locale, uri.path())
        .ok_or_else(|| ApiError::Internal(format!("Login view {} is not registered", state.login.login_view)))?;

    tracing::debug!("Anonymous request to {}: {}", uri.path(), redirect.message);
    Ok(Redirect::to(&redirect.location).into_response())
}
