use clap::Parser;
use microblog::cli::{self, Cli};
use microblog::{create_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Debug and testing runs log to the console; production sinks are
    // attached by the application itself
    if !config.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "microblog=debug,tower_http=debug,axum=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let app = create_app(config).await?;

    if let Some(dispatch) = app.logging.dispatch() {
        tracing::dispatcher::set_global_default(dispatch.clone())?;
    }

    cli::run(app, args.command).await?;

    Ok(())
}
