use crate::application::services::localization::{lazy_gettext, LazyText, Localizer};
use crate::infrastructure::http::blueprint::RouteRegistry;

/// Where anonymous users are sent and what they are told.
#[derive(Debug, Clone)]
pub struct LoginManager {
    pub login_view: &'static str,
    pub login_message: LazyText,
}

impl Default for LoginManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Redirect target plus the flash message for an unauthorized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub location: String,
    pub message: String,
}

impl LoginManager {
    pub fn new() -> Self {
        Self {
            login_view: "auth.login",
            login_message: lazy_gettext("Please log in to access this page."),
        }
    }

    /// Login URL carrying `next`. `None` until the login view's blueprint is
    /// registered.
    pub fn login_url(&self, routes: &RouteRegistry, next: &str) -> Option<String> {
        let login = routes.url_for(self.login_view)?;
        let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
        Some(format!("{}?next={}", login, next))
    }

    pub fn unauthorized(
        &self,
        routes: &RouteRegistry,
        localizer: &Localizer,
        locale: &str,
        next: &str,
    ) -> Option<LoginRedirect> {
        Some(LoginRedirect {
            location: self.login_url(routes, next)?,
            message: self.login_message.resolve(localizer, locale),
        })
    }
}
