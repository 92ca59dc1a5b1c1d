//! Checkout hand-off payload.
//!
//! When the shopper leaves the cart for the payment step, the cart contents
//! and customer details are frozen into a [`CheckoutHandoff`] and parked in a
//! well-known session slot. The payment step reads that slot back; prices in
//! it are the client-side values from the cart and are not re-checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::{Email, Price};

/// Shipping destination for physical products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// Who is buying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub email: Email,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub shipping: Option<ShippingAddress>,
}

/// Why a hand-off could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoffError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("customer name is required")]
    MissingName,
    #[error("a shipping address is required for physical products")]
    MissingShipping,
}

/// Cart contents plus customer info, as handed to the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutHandoff {
    pub items: Vec<CartItem>,
    /// Total in cents at hand-off time.
    pub total: Price,
    pub customer_info: CustomerInfo,
    pub created_at: DateTime<Utc>,
}

impl CheckoutHandoff {
    /// Freeze the cart and customer info into a hand-off.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty, the customer name is blank, or
    /// the cart holds physical products and no shipping address was given.
    pub fn from_cart(cart: &Cart, customer_info: CustomerInfo) -> Result<Self, HandoffError> {
        if cart.is_empty() {
            return Err(HandoffError::EmptyCart);
        }
        if customer_info.name.trim().is_empty() {
            return Err(HandoffError::MissingName);
        }
        let needs_shipping = cart.items().iter().any(|item| item.category.is_physical());
        if needs_shipping && customer_info.shipping.is_none() {
            return Err(HandoffError::MissingShipping);
        }

        Ok(Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            customer_info,
            created_at: Utc::now(),
        })
    }

    /// Whether any purchased item is delivered as IPTV credentials.
    #[must_use]
    pub fn needs_service_credentials(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.category.needs_service_credentials())
    }
}
