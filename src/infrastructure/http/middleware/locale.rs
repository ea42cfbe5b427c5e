use crate::context::AppState;
use axum::{async_trait, extract::FromRequestParts, http::header::ACCEPT_LANGUAGE, http::request::Parts};
use std::convert::Infallible;

/// Locale negotiated from the request's `Accept-Language` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

#[async_trait]
impl FromRequestParts<AppState> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale(state.babel.locale_for(header)))
    }
}
