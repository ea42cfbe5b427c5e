use crate::context::AppState;
use crate::infrastructure::http::controllers::errors;
use crate::infrastructure::http::middleware::negotiate_response_format;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::instrument::WithSubscriber;

/// Mounts every registered blueprint at its prefix.
pub fn build_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new();

    for registered in state.routes.blueprints() {
        router = match registered.url_prefix.as_deref() {
            Some(prefix) => router.nest(prefix, registered.blueprint.routes()),
            None => router.merge(registered.blueprint.routes()),
        };
    }

    router
        .fallback(errors::not_found)
        .layer(CatchPanicLayer::custom(errors::handle_panic))
        .layer(middleware::from_fn(negotiate_response_format))
        // 5xx responses are reported where they fail; the trace is a warning
        .layer(
            TraceLayer::new_for_http()
                .on_failure(DefaultOnFailure::new().level(tracing::Level::WARN)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), scope_logging))
        .with_state(state)
}

/// Runs the request under the application's own log sinks, if it has any.
async fn scope_logging(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.logging.dispatch() {
        Some(dispatch) => next.run(request).with_subscriber(dispatch.clone()).await,
        None => next.run(request).await,
    }
}
