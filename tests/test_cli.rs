mod helpers;

use helpers::*;
use microblog::cli::{self, Command, DbAction};
use microblog::create_app;

#[tokio::test]
async fn test_routes_lists_named_endpoints() {
    let app = create_app(test_config(&[])).await.unwrap();

    let mut out = Vec::new();
    cli::write_routes(&app, &mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();

    let lines: Vec<Vec<&str>> = listing
        .lines()
        .map(|line| line.split_whitespace().collect())
        .collect();
    assert!(lines.contains(&vec!["auth.login", "/auth/login"]));
    assert!(lines.contains(&vec!["main.index", "/"]));
    assert!(lines.contains(&vec!["main.index", "/index"]));
    assert!(lines.contains(&vec!["api.status", "/api/status"]));
}

#[tokio::test]
async fn test_db_upgrade_applies_bundled_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());

    let app = create_app(test_config(&[("DATABASE_URL", db_url.as_str())]))
        .await
        .unwrap();
    cli::run(
        app.clone(),
        Some(Command::Db {
            action: DbAction::Upgrade,
        }),
    )
    .await
    .unwrap();

    let tables: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'posts') ORDER BY name")
            .fetch_all(app.db.pool())
            .await
            .unwrap();
    assert_eq!(tables, vec![("posts".to_string(),), ("users".to_string(),)]);
}

#[tokio::test]
async fn test_db_upgrade_reports_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere").to_string_lossy().to_string();

    let app = create_app(test_config(&[("MIGRATIONS_DIR", missing.as_str())]))
        .await
        .unwrap();
    let result = cli::run(
        app,
        Some(Command::Db {
            action: DbAction::Upgrade,
        }),
    )
    .await;

    assert!(matches!(result, Err(cli::CliError::Migrate(_))));
}
