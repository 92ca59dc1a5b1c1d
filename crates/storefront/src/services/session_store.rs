//! Cart and wishlist persistence in the server-side session.
//!
//! Each store is loaded at the start of a handler, mutated in memory and
//! written back on every mutation. There is no merge: two concurrent
//! requests on the same session are last-write-wins.

use thiserror::Error;
use tower_sessions::Session;
use tracing::warn;

use streamstick_core::cart::{Cart, CartCodec};
use streamstick_core::wishlist::{Wishlist, WishlistCodec};

/// Session slot holding the encoded cart.
pub const CART_SLOT: &str = "cart-storage";

/// Session slot holding the drawer flag, which the cart blob does not carry.
pub const CART_DRAWER_SLOT: &str = "cart-drawer";

/// Session slot holding the wishlist.
pub const WISHLIST_SLOT: &str = "wishlist-storage";

/// Errors reading or writing a session-backed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The shopper's cart, bound to their session.
pub struct SessionCartStore {
    session: Session,
    cart: Cart,
}

impl SessionCartStore {
    /// Rehydrate the cart from the session.
    ///
    /// An unreadable blob is logged and replaced by an empty cart; it is
    /// overwritten on the next mutation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Session` if the session store itself fails.
    pub async fn load(session: Session) -> Result<Self, StoreError> {
        let raw: Option<String> = session.get(CART_SLOT).await?;
        let mut cart = match raw {
            Some(raw) => CartCodec::decode(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable stored cart");
                Cart::new()
            }),
            None => Cart::new(),
        };

        if session.get::<bool>(CART_DRAWER_SLOT).await?.unwrap_or(false) {
            cart.open();
        }

        Ok(Self { session, cart })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Apply `f` to the cart and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be encoded or written.
    pub async fn mutate<R>(&mut self, f: impl FnOnce(&mut Cart) -> R) -> Result<R, StoreError> {
        let out = f(&mut self.cart);
        self.save().await?;
        Ok(out)
    }

    async fn save(&self) -> Result<(), StoreError> {
        let encoded = CartCodec::encode(&self.cart)?;
        self.session.insert(CART_SLOT, encoded).await?;
        self.session
            .insert(CART_DRAWER_SLOT, self.cart.is_open())
            .await?;
        Ok(())
    }
}

/// The shopper's wishlist, bound to their session.
pub struct SessionWishlistStore {
    session: Session,
    wishlist: Wishlist,
}

impl SessionWishlistStore {
    /// Rehydrate the wishlist, falling back to an empty one if the stored
    /// value is unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Session` if the session store itself fails.
    pub async fn load(session: Session) -> Result<Self, StoreError> {
        let raw: Option<String> = session.get(WISHLIST_SLOT).await?;
        let wishlist = match raw {
            Some(raw) => WishlistCodec::decode(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable stored wishlist");
                Wishlist::new()
            }),
            None => Wishlist::new(),
        };
        Ok(Self { session, wishlist })
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// Apply `f` to the wishlist and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the wishlist cannot be encoded or written.
    pub async fn mutate<R>(
        &mut self,
        f: impl FnOnce(&mut Wishlist) -> R,
    ) -> Result<R, StoreError> {
        let out = f(&mut self.wishlist);
        let encoded = WishlistCodec::encode(&self.wishlist)?;
        self.session.insert(WISHLIST_SLOT, encoded).await?;
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use streamstick_core::cart::CartItem;
    use streamstick_core::catalog::ProductCategory;
    use streamstick_core::{Price, ProductId};

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn stick() -> CartItem {
        CartItem {
            id: ProductId::new("fire-stick-4k"),
            name: "Fire Stick 4K".to_string(),
            price: Price::from_cents(4999),
            image: None,
            quantity: 1,
            category: ProductCategory::Firestick,
        }
    }

    #[tokio::test]
    async fn test_cart_survives_reload() {
        let session = session();
        let mut store = SessionCartStore::load(session.clone()).await.unwrap();
        store.mutate(|cart| cart.add_item(stick())).await.unwrap();
        store.mutate(|cart| cart.add_item(stick())).await.unwrap();

        let reloaded = SessionCartStore::load(session).await.unwrap();
        assert_eq!(reloaded.cart().items().len(), 1);
        assert_eq!(reloaded.cart().item_count(), 2);
        assert!(reloaded.cart().is_open());
    }

    #[tokio::test]
    async fn test_unreadable_cart_falls_back_to_empty() {
        let session = session();
        session
            .insert(CART_SLOT, "{not json".to_string())
            .await
            .unwrap();

        let store = SessionCartStore::load(session).await.unwrap();
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_cart_blob_is_read() {
        let session = session();
        session
            .insert(
                CART_SLOT,
                r#"[{"id":"iptv-1-month","name":"1 Month","price":1500,"quantity":3}]"#.to_string(),
            )
            .await
            .unwrap();

        let store = SessionCartStore::load(session).await.unwrap();
        assert_eq!(store.cart().total().cents(), 4500);
    }

    #[tokio::test]
    async fn test_wishlist_toggle_persists() {
        let session = session();
        let mut store = SessionWishlistStore::load(session.clone()).await.unwrap();
        let saved = store
            .mutate(|list| {
                list.toggle(streamstick_core::wishlist::WishlistItem {
                    id: ProductId::new("remote"),
                    name: "Remote".to_string(),
                    price: Price::from_cents(1999),
                    image: None,
                })
            })
            .await
            .unwrap();
        assert!(saved);

        let reloaded = SessionWishlistStore::load(session).await.unwrap();
        assert!(reloaded.wishlist().contains(&ProductId::new("remote")));
    }

    #[tokio::test]
    async fn test_wishlist_from_newer_format_falls_back_to_empty() {
        let session = session();
        session
            .insert(
                WISHLIST_SLOT,
                r#"{"version":9,"items":[{"id":"remote","name":"Remote","price":1999}]}"#
                    .to_string(),
            )
            .await
            .unwrap();

        let store = SessionWishlistStore::load(session).await.unwrap();
        assert!(store.wishlist().items().is_empty());
    }
}
