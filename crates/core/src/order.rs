//! Orders and IPTV service credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::catalog::ProductCategory;
use crate::checkout::ShippingAddress;
use crate::{Email, OrderId, OrderStatus, Price, ProductId};

/// A purchased line, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub category: ProductCategory,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: item.quantity,
            category: item.category,
        }
    }
}

/// Login issued to the customer for the IPTV service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An order as stored in the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_email: Email,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub line_items: Vec<OrderLine>,
    pub amount: Price,
    pub status: OrderStatus,
    pub service_credentials: Option<ServiceCredentials>,
    pub shipping: Option<ShippingAddress>,
    pub stripe_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether any line is delivered as IPTV credentials.
    #[must_use]
    pub fn needs_service_credentials(&self) -> bool {
        self.line_items
            .iter()
            .any(|line| line.category.needs_service_credentials())
    }
}

/// Fields needed to record a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_email: Email,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub line_items: Vec<OrderLine>,
    pub amount: Price,
    pub status: OrderStatus,
    pub service_credentials: Option<ServiceCredentials>,
    pub shipping: Option<ShippingAddress>,
    pub stripe_session_id: Option<String>,
}

/// A row of `storefront.orders` failed to map back into an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order row: {0}")]
pub struct InvalidOrderRow(pub String);

/// Column list matching [`OrderRow`], for `SELECT` and `RETURNING` clauses.
#[cfg(feature = "postgres")]
pub const ORDER_COLUMNS: &str = "id, customer_email, customer_name, customer_phone, \
     line_items, amount_cents, status, service_username, service_password, \
     shipping_line1, shipping_line2, shipping_city, shipping_state, \
     shipping_postal_code, shipping_country, stripe_session_id, created_at, updated_at";

/// Flat row shape of `storefront.orders`.
#[cfg(feature = "postgres")]
#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub line_items: sqlx::types::Json<Vec<OrderLine>>,
    pub amount_cents: i64,
    pub status: OrderStatus,
    pub service_username: Option<String>,
    pub service_password: Option<String>,
    pub shipping_line1: Option<String>,
    pub shipping_line2: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub stripe_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(feature = "postgres")]
impl TryFrom<OrderRow> for Order {
    type Error = InvalidOrderRow;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&row.customer_email)
            .map_err(|e| InvalidOrderRow(format!("order {}: {e}", row.id)))?;
        let amount = Price::try_from(row.amount_cents)
            .map_err(|e| InvalidOrderRow(format!("order {}: {e}", row.id)))?;

        let service_credentials = match (row.service_username, row.service_password) {
            (Some(username), Some(password)) => Some(ServiceCredentials { username, password }),
            _ => None,
        };

        // A shipping address is either complete or absent.
        let shipping = match (
            row.shipping_line1,
            row.shipping_city,
            row.shipping_postal_code,
            row.shipping_country,
        ) {
            (Some(line1), Some(city), Some(postal_code), Some(country)) => Some(ShippingAddress {
                line1,
                line2: row.shipping_line2,
                city,
                state: row.shipping_state,
                postal_code,
                country,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            customer_email,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            line_items: row.line_items.0,
            amount,
            status: row.status,
            service_credentials,
            shipping,
            stripe_session_id: row.stripe_session_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = ServiceCredentials {
            username: "ssp_ab12cd".to_owned(),
            password: "hunter2-but-longer".to_owned(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("ssp_ab12cd"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_order_line_from_cart_item() {
        let item = CartItem {
            id: ProductId::new("iptv-3-month"),
            name: "3 Month IPTV".to_owned(),
            price: Price::from_cents(3999),
            image: None,
            quantity: 2,
            category: ProductCategory::Iptv,
        };
        let line = OrderLine::from(&item);
        assert_eq!(line.unit_price.cents(), 3999);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.category, ProductCategory::Iptv);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_order_columns_are_unique() {
        let columns: Vec<&str> = ORDER_COLUMNS.split(',').map(str::trim).collect();
        let unique: std::collections::HashSet<&str> = columns.iter().copied().collect();
        assert_eq!(columns.len(), 18);
        assert_eq!(unique.len(), columns.len());
        assert_eq!(columns.first(), Some(&"id"));
        assert_eq!(columns.last(), Some(&"updated_at"));
    }
}
