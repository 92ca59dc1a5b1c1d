//! Password reset tokens.
//!
//! Only the SHA-256 hash of a token is stored; the raw token goes to the
//! customer and is never persisted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::Email;

use super::RepositoryError;

pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token hash, replacing any unused token for the same email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip_all, fields(email = %email.redacted()))]
    pub async fn replace(
        &self,
        email: &Email,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM storefront.password_reset_tokens WHERE email = $1 AND used_at IS NULL",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO storefront.password_reset_tokens (token_hash, email, expires_at)
             VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(email)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
