//! CMS settings load and save.
//!
//! Loading flattens stored rows over the schema defaults. Saving validates the
//! whole form first and writes nothing if any field fails; after that each key
//! is written on its own, so one failed write does not hide the others.

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use streamstick_core::settings::{
    FieldError, SaveFailure, SaveReport, SettingCategory, SettingKey, SettingsForm, StoredSetting,
};

use crate::db::settings::{self, SettingsError};

/// Where settings rows are read from and written to.
pub trait SettingsStore: Send + Sync {
    fn list(
        &self,
        categories: &[SettingCategory],
    ) -> impl Future<Output = Result<Vec<StoredSetting>, SettingsError>> + Send;

    fn upsert(
        &self,
        key: SettingKey,
        value: &str,
    ) -> impl Future<Output = Result<(), SettingsError>> + Send;
}

/// `admin.site_settings` in Postgres.
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SettingsStore for PgSettingsStore {
    async fn list(&self, categories: &[SettingCategory]) -> Result<Vec<StoredSetting>, SettingsError> {
        settings::list_settings(&self.pool, categories).await
    }

    async fn upsert(&self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        settings::upsert_setting(&self.pool, key, value).await
    }
}

/// Why a save was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),
}

pub struct SettingsService<S> {
    store: S,
}

impl<S: SettingsStore> SettingsService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Settings for `categories`, defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the rows cannot be read.
    #[instrument(skip(self))]
    pub async fn load_settings(
        &self,
        categories: &[SettingCategory],
    ) -> Result<SettingsForm, SettingsError> {
        let rows = self.store.list(categories).await?;
        let (form, unknown) = SettingsForm::from_rows(categories, rows);
        for key in unknown {
            warn!(key = %key, "Skipping stored setting with unknown key");
        }
        Ok(form)
    }

    /// Validate then write every field in `form`.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Invalid` with every failing field if validation
    /// fails. Write failures are reported per key in the `SaveReport`.
    #[instrument(skip_all, fields(fields = form.len()))]
    pub async fn save(&self, form: &SettingsForm) -> Result<SaveReport, SaveError> {
        form.validate().map_err(SaveError::Invalid)?;

        let mut report = SaveReport::default();
        for (key, value) in form.iter() {
            match self.store.upsert(key, value).await {
                Ok(()) => report.saved.push(key),
                Err(e) => {
                    warn!(key = %key.as_str(), error = %e, "Failed to save setting");
                    report.failed.push(SaveFailure {
                        key,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "Settings saved"
        );
        Ok(report)
    }
}
