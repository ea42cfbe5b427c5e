//! Command-line interface for the `microblog` binary.

use crate::context::AppState;
use crate::infrastructure::http::blueprint::Blueprint;
use crate::infrastructure::http::build_router;
use axum::Router;
use clap::{Parser, Subcommand};
use std::io::Write;

/// Command group. Contributes commands, no routes.
pub const BLUEPRINT: Blueprint = Blueprint::new("cli", routes).with_commands(&["db", "routes"]);

fn routes() -> Router<AppState> {
    Router::new()
}

/// Microblog application server and management commands.
#[derive(Parser, Debug)]
#[command(name = "microblog", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serves the application on SERVER_HOST:SERVER_PORT.
    Serve,
    /// Database management.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Lists every named route.
    Routes,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbAction {
    /// Applies pending migrations.
    Upgrade,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs `command` against a built application.
pub async fn run(app: AppState, command: Option<Command>) -> Result<(), CliError> {
    match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app).await,
        Command::Db {
            action: DbAction::Upgrade,
        } => {
            app.migrate.upgrade().await?;
            Ok(())
        }
        Command::Routes => {
            let mut out = std::io::stdout().lock();
            write_routes(&app, &mut out)?;
            Ok(())
        }
    }
}

/// Writes one `endpoint  path` line per route.
pub fn write_routes(app: &AppState, out: &mut impl Write) -> std::io::Result<()> {
    let rules = app.routes.rules();
    let width = rules.iter().map(|(endpoint, _)| endpoint.len()).max().unwrap_or(0);

    for (endpoint, path) in rules {
        writeln!(out, "{:<width$}  {}", endpoint, path, width = width)?;
    }
    Ok(())
}

async fn serve(app: AppState) -> Result<(), CliError> {
    let addr = app.config.server_address();
    let router = build_router(app);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
