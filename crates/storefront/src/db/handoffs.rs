//! Checkout hand-offs parked between Stripe session creation and the
//! completion webhook.

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use streamstick_core::checkout::CheckoutHandoff;

use super::RepositoryError;

pub struct HandoffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HandoffRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store the hand-off under its Stripe session id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, handoff))]
    pub async fn insert(
        &self,
        stripe_session_id: &str,
        handoff: &CheckoutHandoff,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.checkout_handoffs (stripe_session_id, payload)
             VALUES ($1, $2)
             ON CONFLICT (stripe_session_id) DO UPDATE SET payload = EXCLUDED.payload",
        )
        .bind(stripe_session_id)
        .bind(Json(handoff))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Load the hand-off for a Stripe session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or the payload
    /// no longer decodes.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        stripe_session_id: &str,
    ) -> Result<Option<CheckoutHandoff>, RepositoryError> {
        let payload = sqlx::query_scalar::<_, Json<CheckoutHandoff>>(
            "SELECT payload FROM storefront.checkout_handoffs WHERE stripe_session_id = $1",
        )
        .bind(stripe_session_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(payload.map(|Json(handoff)| handoff))
    }

    /// Drop the hand-off once the order exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, stripe_session_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.checkout_handoffs WHERE stripe_session_id = $1")
            .bind(stripe_session_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
