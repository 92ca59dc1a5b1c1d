//! StreamStick Core - Shared domain types.
//!
//! This crate provides the types used across all StreamStick components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, tracking)
//! - `admin` - Operator API (CMS settings, orders, analytics)
//! - `cli` - Migrations, seeding and gateway-backed maintenance commands
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no
//! database access, no HTTP clients. Persistence formats live behind explicit
//! codecs so the binaries decide where bytes are stored.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and statuses
//! - [`cart`] - The shopping cart store and its persisted codec
//! - [`wishlist`] - Saved-for-later product list
//! - [`checkout`] - Payload handed from the cart to the payment step
//! - [`settings`] - Closed, versioned CMS settings schema
//! - [`catalog`] - Products and blog posts
//! - [`order`] - Orders and IPTV service credentials
//! - [`analytics`] - Visitor tracking events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod settings;
pub mod types;
pub mod wishlist;

pub use types::*;
