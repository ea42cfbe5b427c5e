use crate::application::services::{Localizer, LoginManager, Moment};
use crate::config::Config;
use crate::domain::ports::task_queue::TaskQueue;
use crate::infrastructure::http::blueprint::RouteRegistry;
use crate::infrastructure::observability::Logging;
use crate::infrastructure::persistence::{Database, Migrate};
use crate::infrastructure::providers::{CacheClient, Mail, SearchClient};
use std::sync::Arc;

/// Shared handle passed to every request handler.
pub type AppState = Arc<AppContext>;

/// A fully initialized application: configuration, extensions, external
/// service clients, registered blueprints and log sinks.
pub struct AppContext {
    pub config: Config,

    // Extensions
    pub db: Database,
    pub migrate: Migrate,
    pub login: LoginManager,
    pub mail: Mail,
    pub moment: Moment,
    pub babel: Localizer,

    // External services
    pub search: Option<SearchClient>,
    pub redis: CacheClient,
    pub task_queue: Arc<dyn TaskQueue>,

    pub routes: RouteRegistry,
    pub logging: Logging,
}

impl AppContext {
    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }
}
