use crate::application::services::{select_locale, LocalizationError, Localizer, LoginManager, Moment};
use crate::config::Config;
use crate::context::{AppContext, AppState};
use crate::domain::ports::mail_transport::{MailError, MailTransport};
use crate::domain::ports::task_queue::TaskQueue;
use crate::infrastructure::http::blueprint::{Blueprint, RegistrationError, RouteRegistry};
use crate::infrastructure::http::controllers::{api, auth, errors, main};
use crate::infrastructure::observability::{configure_production_logging, Logging};
use crate::infrastructure::persistence::{Database, Migrate};
use crate::infrastructure::providers::{CacheClient, CacheError, Mail, SearchClient, SearchError};
use crate::infrastructure::workers::{RedisTaskQueue, DEFAULT_QUEUE_NAME};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Localization error: {0}")]
    Localization(#[from] LocalizationError),

    #[error("Blueprint registration error: {0}")]
    Registration(#[from] RegistrationError),
}

/// Builds a fully initialized application from `config`.
pub async fn create_app(config: Config) -> Result<AppState, BootstrapError> {
    Bootstrapper::new(config).build().await
}

struct Extensions {
    db: Database,
    migrate: Migrate,
    login: LoginManager,
    mail: Mail,
    moment: Moment,
    babel: Localizer,
}

struct Services {
    search: Option<SearchClient>,
    redis: CacheClient,
    task_queue: Arc<dyn TaskQueue>,
}

/// Application factory with optional overrides.
pub struct Bootstrapper {
    config: Config,
    mail_transport: Option<Arc<dyn MailTransport>>,
    extra_blueprints: Vec<(Blueprint, Option<&'static str>)>,
}

impl Bootstrapper {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mail_transport: None,
            extra_blueprints: Vec::new(),
        }
    }

    /// Replaces the SMTP transport used by the mail extension and the
    /// failure-report sink.
    pub fn with_mail_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.mail_transport = Some(transport);
        self
    }

    /// Registers `blueprint` after the built-in ones.
    pub fn with_blueprint(mut self, blueprint: Blueprint, url_prefix: Option<&'static str>) -> Self {
        self.extra_blueprints.push((blueprint, url_prefix));
        self
    }

    pub async fn build(self) -> Result<AppState, BootstrapError> {
        let Bootstrapper {
            config,
            mail_transport,
            extra_blueprints,
        } = self;

        let extensions = initialize_extensions(&config, mail_transport).await?;
        let services = configure_external_services(&config)?;
        let routes = register_blueprints(&extra_blueprints)?;

        let logging = if config.is_production() {
            configure_production_logging(&config, &extensions.mail)
        } else {
            Logging::disabled()
        };

        Ok(Arc::new(AppContext {
            config,
            db: extensions.db,
            migrate: extensions.migrate,
            login: extensions.login,
            mail: extensions.mail,
            moment: extensions.moment,
            babel: extensions.babel,
            search: services.search,
            redis: services.redis,
            task_queue: services.task_queue,
            routes,
            logging,
        }))
    }
}

async fn initialize_extensions(
    config: &Config,
    mail_transport: Option<Arc<dyn MailTransport>>,
) -> Result<Extensions, BootstrapError> {
    let db = Database::connect_lazy(&config.database_url)?;
    let migrate = Migrate::new(&db, config.migrations_dir.clone());
    tracing::info!("Database extension initialized");

    let login = LoginManager::new();
    tracing::info!("Login manager initialized (login view: {})", login.login_view);

    let mail = Mail::from_config(config, mail_transport)?;
    if mail.is_configured() {
        tracing::info!("Mail extension initialized");
    } else {
        tracing::info!("Mail extension initialized without a mail server");
    }

    let moment = Moment::new();

    let babel =
        Localizer::load(config.languages.clone(), &config.translations_dir, select_locale).await?;
    tracing::info!("Localization initialized for {:?}", babel.languages());

    Ok(Extensions {
        db,
        migrate,
        login,
        mail,
        moment,
        babel,
    })
}

fn configure_external_services(config: &Config) -> Result<Services, BootstrapError> {
    let search = match config.elasticsearch_url.as_deref() {
        Some(url) => {
            let client = SearchClient::new(url)?;
            tracing::info!("Search client configured for {}", client.base_url());
            Some(client)
        }
        None => None,
    };

    let redis = CacheClient::from_url(&config.redis_url)?;
    let task_queue = RedisTaskQueue::new(DEFAULT_QUEUE_NAME, redis.clone());
    tracing::info!("Task queue {} bound to {}", task_queue.name(), redis.url());

    Ok(Services {
        search,
        redis,
        task_queue: Arc::new(task_queue),
    })
}

fn register_blueprints(
    extra: &[(Blueprint, Option<&'static str>)],
) -> Result<RouteRegistry, BootstrapError> {
    let mut routes = RouteRegistry::new();
    routes.register(errors::BLUEPRINT, None)?;
    routes.register(auth::BLUEPRINT, Some("/auth"))?;
    routes.register(main::BLUEPRINT, None)?;
    routes.register(crate::cli::BLUEPRINT, None)?;
    routes.register(api::BLUEPRINT, Some("/api"))?;
    for (blueprint, url_prefix) in extra {
        routes.register(*blueprint, *url_prefix)?;
    }

    tracing::info!("Registered blueprints: {:?}", routes.names());
    Ok(routes)
}
