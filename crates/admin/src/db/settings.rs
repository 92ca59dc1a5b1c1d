//! `admin.site_settings` reads and writes.

use sqlx::PgPool;

use streamstick_core::settings::{
    SETTINGS_SCHEMA_VERSION, SettingCategory, SettingKey, StoredSetting,
};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// All stored rows in the given categories.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_settings(
    pool: &PgPool,
    categories: &[SettingCategory],
) -> Result<Vec<StoredSetting>, SettingsError> {
    let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();

    let rows = sqlx::query_as::<_, StoredSetting>(
        r"
        SELECT key, value FROM admin.site_settings
        WHERE category = ANY($1)
        ORDER BY key
        ",
    )
    .bind(&names)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert or overwrite one setting. Last write wins.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn upsert_setting(pool: &PgPool, key: SettingKey, value: &str) -> Result<(), SettingsError> {
    sqlx::query(
        r"
        INSERT INTO admin.site_settings (key, value, category, schema_version)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (key) DO UPDATE
        SET value = $2, category = $3, schema_version = $4, updated_at = NOW()
        ",
    )
    .bind(key.as_str())
    .bind(value)
    .bind(key.category().as_str())
    .bind(SETTINGS_SCHEMA_VERSION)
    .execute(pool)
    .await?;

    Ok(())
}
