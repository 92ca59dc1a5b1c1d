//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::cms::{PgSettingsStore, SettingsService};

/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    settings: SettingsService<PgSettingsStore>,
    api_token_digest: [u8; 32],
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let api_token_digest = Sha256::digest(config.api_token.expose_secret().as_bytes()).into();
        let settings = SettingsService::new(PgSettingsStore::new(pool.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
                api_token_digest,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsService<PgSettingsStore> {
        &self.inner.settings
    }

    /// SHA-256 of the configured API token.
    #[must_use]
    pub fn api_token_digest(&self) -> &[u8; 32] {
        &self.inner.api_token_digest
    }
}
