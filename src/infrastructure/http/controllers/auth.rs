use crate::context::AppState;
use crate::infrastructure::http::blueprint::{Blueprint, Endpoint};
use crate::infrastructure::http::middleware::Locale;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;

const ENDPOINTS: &[Endpoint] = &[
    Endpoint::new("login", "/login"),
    Endpoint::new("logout", "/logout"),
];

pub const BLUEPRINT: Blueprint = Blueprint::new("auth", routes).with_endpoints(ENDPOINTS);

fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Locale(locale): Locale,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let title = state.babel.gettext(&locale, "Sign In");
    let notice = match query.next {
        Some(_) => format!(
            "<p class=\"flash\">{}</p>",
            state.login.login_message.resolve(&state.babel, &locale)
        ),
        None => String::new(),
    };
    let action = match query.next.as_deref() {
        Some(next) => {
            let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
            format!("?next={}", next)
        }
        None => String::new(),
    };

    Html(format!(
        "<!doctype html>\n<html lang=\"{locale}\"><head><title>{title} - Microblog</title></head>\
         <body><h1>{title}</h1>{notice}\
         <form method=\"post\" action=\"{action}\"></form>\
         <p>{now}</p></body></html>",
        locale = locale,
        title = title,
        notice = notice,
        action = action,
        now = state.moment.format(chrono::Utc::now(), "LLL"),
    ))
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    let index = state
        .routes
        .url_for("main.index")
        .unwrap_or_else(|| "/".to_string());
    Redirect::to(&index)
}
