//! Database operations for admin.
//!
//! # Schemas
//!
//! - `admin.site_settings` - CMS copy, one row per [`SettingKey`]
//! - `storefront.orders` - read and status updates only; orders are created
//!   by the storefront webhook
//! - `storefront.visitor_events`, `storefront.page_views` - read for the
//!   analytics summary
//!
//! Migrations live in the workspace `migrations/` directory and are applied
//! with `ssp-cli migrate`.
//!
//! [`SettingKey`]: streamstick_core::settings::SettingKey

pub mod analytics;
pub mod orders;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use streamstick_core::OrderStatus;

pub use analytics::AnalyticsRepository;
pub use orders::{OrderFilter, OrderRepository};
pub use settings::SettingsError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// The requested status change is not an allowed lifecycle step.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<streamstick_core::order::InvalidOrderRow> for RepositoryError {
    fn from(err: streamstick_core::order::InvalidOrderRow) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// Admin traffic is a handful of operators, so the pool is small.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
