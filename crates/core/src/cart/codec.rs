//! Persisted cart format.
//!
//! The stored blob is `{"version":1,"items":[...]}`. Blobs written before the
//! format was versioned are a bare JSON array of items and are still read.
//! The drawer flag is not persisted; a rehydrated cart starts closed.

use serde::{Deserialize, Serialize};

use super::{Cart, CartItem};

/// Current version of the persisted cart blob.
pub const CART_FORMAT_VERSION: u32 = 1;

/// Why a stored cart blob could not be read.
#[derive(Debug, thiserror::Error)]
pub enum CartDecodeError {
    #[error("cart blob is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported cart format version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct StoredCartRef<'a> {
    version: u32,
    items: &'a [CartItem],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { version: u32, items: Vec<CartItem> },
    Legacy(Vec<CartItem>),
}

/// Encoder/decoder between [`Cart`] and its stored string form.
pub struct CartCodec;

impl CartCodec {
    /// Serialize the cart's items.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails, which does not
    /// happen for the types involved but is surfaced rather than hidden.
    pub fn encode(cart: &Cart) -> Result<String, serde_json::Error> {
        serde_json::to_string(&StoredCartRef {
            version: CART_FORMAT_VERSION,
            items: cart.items(),
        })
    }

    /// Rebuild a cart from a stored blob.
    ///
    /// # Errors
    ///
    /// Returns [`CartDecodeError::Malformed`] for anything that is not a
    /// recognizable cart and [`CartDecodeError::UnsupportedVersion`] for a
    /// blob written by a newer format.
    pub fn decode(raw: &str) -> Result<Cart, CartDecodeError> {
        match serde_json::from_str::<StoredCart>(raw)? {
            StoredCart::Versioned { version, items } if version <= CART_FORMAT_VERSION => {
                Ok(Cart::from_items(items))
            }
            StoredCart::Versioned { version, .. } => {
                Err(CartDecodeError::UnsupportedVersion(version))
            }
            StoredCart::Legacy(items) => Ok(Cart::from_items(items)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ProductCategory;
    use crate::{Price, ProductId};

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        for (id, cents) in [("fire-stick-4k", 4999), ("iptv-12-month", 8999)] {
            cart.add_item(CartItem {
                id: ProductId::new(id),
                name: id.to_owned(),
                price: Price::from_cents(cents),
                image: Some(format!("/images/{id}.webp")),
                quantity: 1,
                category: ProductCategory::Iptv,
            });
        }
        cart.add_item(cart.items()[0].clone());
        cart
    }

    #[test]
    fn test_round_trip_preserves_items() {
        let cart = sample_cart();
        let decoded = CartCodec::decode(&CartCodec::encode(&cart).unwrap()).unwrap();
        assert_eq!(decoded.items(), cart.items());
        assert!(!decoded.is_open());
    }

    #[test]
    fn test_decodes_legacy_bare_array() {
        let raw = r#"[{"id":"a","name":"A","price":1000,"quantity":2}]"#;
        let cart = CartCodec::decode(raw).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total().cents(), 2000);
        assert_eq!(cart.items()[0].category, ProductCategory::Firestick);
    }

    #[test]
    fn test_rejects_garbage_and_future_versions() {
        assert!(matches!(
            CartCodec::decode("{not json"),
            Err(CartDecodeError::Malformed(_))
        ));
        assert!(matches!(
            CartCodec::decode(r#"{"version":9,"items":[]}"#),
            Err(CartDecodeError::UnsupportedVersion(9))
        ));
        assert!(CartCodec::decode(r#"[{"id":"a","name":"A","price":-5}]"#).is_err());
    }
}
