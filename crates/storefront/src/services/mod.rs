//! Business logic services for the storefront.
//!
//! - `catalog` - cached product and post lists
//! - `session_store` - cart and wishlist persisted in the server-side session
//! - `stripe` - Checkout Session creation and webhook verification
//! - `credentials` - IPTV service login generation
//! - `fulfillment` - orders from Stripe payment outcomes
//! - `geo` - best-effort IP geolocation for tracking
//! - `markdown` - blog body rendering

pub mod catalog;
pub mod credentials;
pub mod fulfillment;
pub mod geo;
pub mod markdown;
pub mod session_store;
pub mod stripe;

pub use catalog::CatalogCache;
pub use fulfillment::{Fulfillment, PgOrderStore};
pub use geo::GeoClient;
pub use session_store::{SessionCartStore, SessionWishlistStore, StoreError};
pub use stripe::{StripeClient, StripeError};
