//! Wishlist route handlers.

use axum::{Json, extract::Path};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use streamstick_core::ProductId;
use streamstick_core::wishlist::{Wishlist, WishlistItem};

use crate::error::{AppError, Result};
use crate::services::SessionWishlistStore;

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItem>,
}

impl From<&Wishlist> for WishlistView {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            items: wishlist.items().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// Whether the product is saved after the toggle.
    pub saved: bool,
    pub items: Vec<WishlistItem>,
}

/// `GET /api/wishlist`
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<WishlistView>> {
    let store = SessionWishlistStore::load(session).await?;
    Ok(Json(WishlistView::from(store.wishlist())))
}

/// `POST /api/wishlist/items`
#[instrument(skip(session, item), fields(product_id = %item.id))]
pub async fn add(session: Session, Json(item): Json<WishlistItem>) -> Result<Json<WishlistView>> {
    let mut store = SessionWishlistStore::load(session).await?;
    store.mutate(|w| w.add(item)).await?;
    Ok(Json(WishlistView::from(store.wishlist())))
}

/// `POST /api/wishlist/items/{id}/toggle`
///
/// The body carries the item so it can be saved when absent; its id must
/// match the path.
#[instrument(skip(session, item))]
pub async fn toggle(
    session: Session,
    Path(id): Path<ProductId>,
    Json(item): Json<WishlistItem>,
) -> Result<Json<ToggleResponse>> {
    if item.id != id {
        return Err(AppError::BadRequest(
            "item id does not match the path".to_string(),
        ));
    }
    let mut store = SessionWishlistStore::load(session).await?;
    let saved = store.mutate(|w| w.toggle(item)).await?;
    Ok(Json(ToggleResponse {
        saved,
        items: store.wishlist().items().to_vec(),
    }))
}

/// `DELETE /api/wishlist/items/{id}`
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Json<WishlistView>> {
    let mut store = SessionWishlistStore::load(session).await?;
    store.mutate(|w| w.remove(&id)).await?;
    Ok(Json(WishlistView::from(store.wishlist())))
}
