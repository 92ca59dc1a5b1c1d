//! Order writes from the checkout flow.
//!
//! Orders are never deleted. Operator status changes happen in the admin
//! binary; here only payment outcomes move an order.

use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::order::{NewOrder, ORDER_COLUMNS, Order, OrderRow, ServiceCredentials};
use streamstick_core::{Email, OrderId, OrderStatus};

use super::{RepositoryError, is_unique_violation};

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order already exists for the
    /// Stripe session, `RepositoryError::Database` for other failures.
    #[instrument(skip(self, order), fields(email = %order.customer_email.redacted(), status = %order.status))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let shipping = order.shipping.as_ref();
        let credentials = order.service_credentials.as_ref();

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO storefront.orders (
                 id, customer_email, customer_name, customer_phone, line_items,
                 amount_cents, status, service_username, service_password,
                 shipping_line1, shipping_line2, shipping_city, shipping_state,
                 shipping_postal_code, shipping_country, stripe_session_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(OrderId::generate())
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(sqlx::types::Json(&order.line_items))
        .bind(order.amount.cents())
        .bind(order.status)
        .bind(credentials.map(|c| c.username.as_str()))
        .bind(credentials.map(|c| c.password.as_str()))
        .bind(shipping.map(|s| s.line1.as_str()))
        .bind(shipping.and_then(|s| s.line2.as_deref()))
        .bind(shipping.map(|s| s.city.as_str()))
        .bind(shipping.and_then(|s| s.state.as_deref()))
        .bind(shipping.map(|s| s.postal_code.as_str()))
        .bind(shipping.map(|s| s.country.as_str()))
        .bind(&order.stripe_session_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict("order already recorded for this Stripe session".into())
            } else {
                RepositoryError::Database(e)
            }
        })?;

        Ok(Order::try_from(row)?)
    }

    /// The order created for a Stripe Checkout Session, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored row is invalid.
    #[instrument(skip(self))]
    pub async fn find_by_stripe_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE stripe_session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose().map_err(Into::into)
    }

    /// Move an order from `from` to `to`, filling in service credentials if
    /// the order has none yet.
    ///
    /// Returns `None` when the order is no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, credentials))]
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        credentials: Option<&ServiceCredentials>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE storefront.orders
             SET status = $3,
                 service_username = COALESCE(service_username, $4),
                 service_password = COALESCE(service_password, $5),
                 updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(credentials.map(|c| c.username.as_str()))
        .bind(credentials.map(|c| c.password.as_str()))
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose().map_err(Into::into)
    }

    /// Whether any order was placed with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email), fields(email = %email.redacted()))]
    pub async fn exists_for_email(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.orders WHERE customer_email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
