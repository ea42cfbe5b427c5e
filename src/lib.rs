pub mod application;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod infrastructure;

pub use bootstrap::{create_app, BootstrapError, Bootstrapper};
pub use config::{Config, ConfigError};
pub use context::{AppContext, AppState};
