//! Checkout hand-off and Stripe Checkout Session creation.
//!
//! The hand-off is parked in the session slot [`CHECKOUT_SLOT`] by
//! `POST /api/checkout`; the checkout page reads it back and then asks for a
//! Stripe session. Prices come from the cart as-is.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use streamstick_core::checkout::{CheckoutHandoff, CustomerInfo};

use crate::db::HandoffRepository;
use crate::error::{Result, add_breadcrumb};
use crate::services::SessionCartStore;
use crate::state::AppState;

/// Session slot holding the serialized [`CheckoutHandoff`].
pub const CHECKOUT_SLOT: &str = "streamstickpro_checkout";

/// Where shoppers without a hand-off are sent.
const CART_PAGE: &str = "/cart";

#[derive(Debug, Serialize)]
pub struct HandoffCreated {
    pub redirect: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckoutSessionCreated {
    pub url: Option<String>,
    pub session_id: String,
}

/// Read the hand-off slot. Missing and unreadable slots are both `None`.
async fn read_handoff(session: &Session) -> Option<CheckoutHandoff> {
    match session.get::<CheckoutHandoff>(CHECKOUT_SLOT).await {
        Ok(handoff) => handoff,
        Err(e) => {
            warn!(error = %e, "Unreadable checkout hand-off");
            None
        }
    }
}

/// `POST /api/checkout`
#[instrument(skip_all, fields(email = %customer.email.redacted()))]
pub async fn create_handoff(
    session: Session,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<HandoffCreated>> {
    let store = SessionCartStore::load(session.clone()).await?;
    let handoff = CheckoutHandoff::from_cart(store.cart(), customer)?;

    session.insert(CHECKOUT_SLOT, &handoff).await?;
    add_breadcrumb(
        "checkout",
        "Hand-off created",
        &[("total", &handoff.total.to_string())],
    );

    Ok(Json(HandoffCreated {
        redirect: "/checkout",
    }))
}

/// `GET /api/checkout`
#[instrument(skip_all)]
pub async fn show_handoff(session: Session) -> Response {
    match read_handoff(&session).await {
        Some(handoff) => Json(handoff).into_response(),
        None => Redirect::to(CART_PAGE).into_response(),
    }
}

/// `POST /api/checkout/session`
#[instrument(skip_all)]
pub async fn create_stripe_session(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let Some(handoff) = read_handoff(&session).await else {
        return Ok(Redirect::to(CART_PAGE).into_response());
    };

    let base_url = &state.config().base_url;
    let success_url = format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{base_url}{CART_PAGE}");

    let checkout = state
        .stripe()
        .create_checkout_session(&handoff, &success_url, &cancel_url)
        .await?;

    HandoffRepository::new(state.pool())
        .insert(&checkout.id, &handoff)
        .await?;

    info!(stripe_session_id = %checkout.id, "Stripe checkout session created");

    Ok(Json(CheckoutSessionCreated {
        url: checkout.url,
        session_id: checkout.id,
    })
    .into_response())
}
