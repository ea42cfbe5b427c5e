use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub secret_key: String,
    pub database_url: String,
    pub migrations_dir: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    pub mail_server: Option<String>,
    pub mail_port: u16,
    /// `None` when `MAIL_USE_TLS` is not set at all.
    pub mail_use_tls: Option<bool>,
    pub mail_username: Option<String>,
    pub mail_password: Option<String>,
    pub admins: Vec<String>,
    pub log_to_stdout: bool,
    pub log_dir: PathBuf,
    pub elasticsearch_url: Option<String>,
    pub redis_url: String,
    pub languages: Vec<String>,
    pub translations_dir: PathBuf,
    pub posts_per_page: u32,
    pub debug: bool,
    pub testing: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let secret_key = get("SECRET_KEY").unwrap_or_else(|| "you-will-never-guess".to_string());

        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| "sqlite://app.db?mode=rwc".to_string());

        let migrations_dir = get("MIGRATIONS_DIR").unwrap_or_else(|| "migrations".to_string());

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = get("SERVER_PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort("SERVER_PORT"))?;

        let mail_port = get("MAIL_PORT")
            .unwrap_or_else(|| "25".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort("MAIL_PORT"))?;

        let mail_use_tls = get("MAIL_USE_TLS")
            .map(|value| parse_flag("MAIL_USE_TLS", &value))
            .transpose()?;

        let admins = get("ADMINS")
            .map(|value| split_list(&value))
            .unwrap_or_else(|| vec!["your-email@example.com".to_string()]);

        let languages = get("LANGUAGES")
            .map(|value| split_list(&value))
            .unwrap_or_else(|| vec!["en".to_string(), "es".to_string()]);

        let redis_url = get("REDIS_URL").ok_or(ConfigError::MissingRedisUrl)?;

        let posts_per_page = match get("POSTS_PER_PAGE") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("POSTS_PER_PAGE", value))?,
            None => 25,
        };

        Ok(Config {
            secret_key,
            database_url,
            migrations_dir: PathBuf::from(migrations_dir),
            server_host,
            server_port,
            mail_server: get("MAIL_SERVER"),
            mail_port,
            mail_use_tls,
            mail_username: get("MAIL_USERNAME"),
            mail_password: get("MAIL_PASSWORD"),
            admins,
            log_to_stdout: get_flag(&get, "LOG_TO_STDOUT")?,
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| "logs".to_string())),
            elasticsearch_url: get("ELASTICSEARCH_URL"),
            redis_url,
            languages,
            translations_dir: PathBuf::from(
                get("TRANSLATIONS_DIR").unwrap_or_else(|| "translations".to_string()),
            ),
            posts_per_page,
            debug: get_flag(&get, "DEBUG")?,
            testing: get_flag(&get, "TESTING")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Production mode: neither debug nor testing.
    pub fn is_production(&self) -> bool {
        !self.debug && !self.testing
    }
}

fn get_flag<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| parse_flag(key, &value))
        .transpose()
        .map(|flag| flag.unwrap_or(false))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(key, value.to_string())),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REDIS_URL environment variable not set")]
    MissingRedisUrl,

    #[error("Invalid port number in {0}")]
    InvalidPort(&'static str),

    #[error("Invalid boolean value for {0}: {1}")]
    InvalidFlag(&'static str, String),

    #[error("Invalid number for {0}: {1}")]
    InvalidNumber(&'static str, String),
}
