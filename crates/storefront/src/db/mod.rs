//! Database operations for the storefront.
//!
//! # Schema: `storefront`
//!
//! - `products`, `blog_posts` - catalog, seeded with `ssp-cli seed`
//! - `orders` - system of record for purchases
//! - `checkout_handoffs` - hand-off payloads keyed by Stripe session id
//! - `visitor_events`, `page_views` - tracking
//! - `password_reset_tokens`
//!
//! `admin.site_settings` is read here for public copy; only the admin binary
//! writes it.
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! ssp-cli migrate
//! ```

pub mod blog;
pub mod handoffs;
pub mod orders;
pub mod password_reset;
pub mod products;
pub mod site_settings;
pub mod tracking;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blog::BlogRepository;
pub use handoffs::HandoffRepository;
pub use orders::OrderRepository;
pub use password_reset::PasswordResetRepository;
pub use products::ProductRepository;
pub use site_settings::SiteSettingsRepository;
pub use tracking::TrackingRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate Stripe session id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<streamstick_core::order::InvalidOrderRow> for RepositoryError {
    fn from(err: streamstick_core::order::InvalidOrderRow) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Whether an error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
