//! Read-only access to the CMS settings the admin binary writes.

use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::settings::{SettingCategory, StoredSetting};

use super::RepositoryError;

pub struct SiteSettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SiteSettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stored rows for the given categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        categories: &[SettingCategory],
    ) -> Result<Vec<StoredSetting>, RepositoryError> {
        let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
        let rows = sqlx::query_as::<_, StoredSetting>(
            "SELECT key, value FROM admin.site_settings WHERE category = ANY($1) ORDER BY key",
        )
        .bind(names)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
