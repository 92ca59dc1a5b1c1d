//! Database migrations.
//!
//! Both binaries share one database; the workspace `migrations/` directory
//! creates the `storefront` and `admin` schemas and the session table. The
//! servers never migrate on startup.
//!
//! ```bash
//! ssp-cli migrate
//! ```

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    info!("Migrations complete");
    Ok(())
}
