//! Cart route handlers.
//!
//! Every handler loads the session cart, applies one operation and writes it
//! back before answering with the full [`CartView`].

use axum::{Json, extract::Path};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use streamstick_core::cart::{Cart, CartItem};
use streamstick_core::catalog::ProductCategory;
use streamstick_core::{Price, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::services::SessionCartStore;

/// Cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_cents: i64,
    pub item_count: u64,
    pub is_open: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total_cents: cart.total().cents(),
            item_count: cart.item_count(),
            is_open: cart.is_open(),
        }
    }
}

/// Body of `POST /api/cart/items`. Quantity is not accepted; each add counts
/// as one unit.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
}

impl From<AddItemRequest> for CartItem {
    fn from(req: AddItemRequest) -> Self {
        Self {
            id: req.id,
            name: req.name,
            price: req.price,
            image: req.image,
            quantity: 1,
            category: req.category,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

async fn apply(session: Session, f: impl FnOnce(&mut Cart)) -> Result<Json<CartView>> {
    let mut store = SessionCartStore::load(session).await?;
    store.mutate(f).await?;
    Ok(Json(CartView::from(store.cart())))
}

/// `GET /api/cart`
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let store = SessionCartStore::load(session).await?;
    Ok(Json(CartView::from(store.cart())))
}

/// `POST /api/cart/items`
#[instrument(skip(session, body), fields(product_id = %body.id))]
pub async fn add(session: Session, Json(body): Json<AddItemRequest>) -> Result<Json<CartView>> {
    add_breadcrumb("cart", "Added item", &[("product_id", body.id.as_str())]);
    apply(session, |cart| cart.add_item(body.into())).await
}

/// `PATCH /api/cart/items/{id}`
#[instrument(skip(session, body), fields(quantity = body.quantity))]
pub async fn update(
    session: Session,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    apply(session, |cart| cart.update_quantity(&id, body.quantity)).await
}

/// `DELETE /api/cart/items/{id}`
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Json<CartView>> {
    add_breadcrumb("cart", "Removed item", &[("product_id", id.as_str())]);
    apply(session, |cart| cart.remove_item(&id)).await
}

/// `DELETE /api/cart`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    apply(session, Cart::clear).await
}

#[instrument(skip(session))]
pub async fn open_drawer(session: Session) -> Result<Json<CartView>> {
    apply(session, Cart::open).await
}

#[instrument(skip(session))]
pub async fn close_drawer(session: Session) -> Result<Json<CartView>> {
    apply(session, Cart::close).await
}

#[instrument(skip(session))]
pub async fn toggle_drawer(session: Session) -> Result<Json<CartView>> {
    apply(session, Cart::toggle).await
}
