use super::Database;
use sqlx::migrate::{MigrateError, Migrator};
use std::path::{Path, PathBuf};

/// Schema migration tool bound to a database.
#[derive(Clone)]
pub struct Migrate {
    db: Database,
    directory: PathBuf,
}

impl Migrate {
    pub fn new(db: &Database, directory: impl Into<PathBuf>) -> Self {
        Self {
            db: db.clone(),
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Applies every pending migration found in the migrations directory.
    pub async fn upgrade(&self) -> Result<(), MigrateError> {
        let migrator = Migrator::new(self.directory.as_path()).await?;
        migrator.run(self.db.pool()).await?;
        tracing::info!(
            "Database migrations applied from {}",
            self.directory.display()
        );
        Ok(())
    }
}
