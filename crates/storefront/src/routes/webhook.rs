//! Stripe webhook receiver.
//!
//! Orders are created here, never from the browser. Deliveries are
//! at-least-once and may arrive out of order; settling is keyed on the Stripe
//! session id so repeats are harmless.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::services::fulfillment::settled_status;
use crate::services::stripe::CheckoutSession;
use crate::services::{Fulfillment, PgOrderStore};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /api/stripe/webhook`
#[instrument(skip_all)]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Stripe-Signature header".to_string()))?;
    let payload = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("webhook body is not UTF-8".to_string()))?;

    let event = state
        .stripe()
        .verify_webhook(payload, signature)
        .map_err(|e| {
            warn!(error = %e, "Rejected Stripe webhook");
            AppError::BadRequest("invalid webhook signature".to_string())
        })?;

    info!(event_id = %event.id, event_type = %event.event_type, "Stripe event received");

    let settlement = if event.event_type.starts_with("checkout.session.") {
        let session = parse_session(event.data.object)?;
        settled_status(&event.event_type, &session).map(|target| (session, target))
    } else {
        None
    };

    match settlement {
        Some((session, target)) => {
            Fulfillment::new(PgOrderStore::new(state.pool().clone()))
                .settle(&session, target)
                .await?;
        }
        None => info!(event_type = %event.event_type, "Ignoring Stripe event"),
    }

    Ok(Json(json!({ "received": true })))
}

fn parse_session(object: serde_json::Value) -> Result<CheckoutSession> {
    serde_json::from_value(object)
        .map_err(|e| AppError::BadRequest(format!("malformed checkout session: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::services::stripe::sign_payload;
    use crate::test_support::{body_json, test_app};

    const SECRET: &[u8] = b"whsec_Qm9vN2ZkM3JqZ0x0a2E5";

    fn delivery(payload: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::post("/api/stripe/webhook")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(payload.to_string())).unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[tokio::test]
    async fn test_missing_signature_rejected() {
        let response = test_app().oneshot(delivery("{}", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let payload = json!({"id": "evt_1", "type": "ping", "data": {"object": {}}}).to_string();
        let forged = sign_payload(b"whsec_someone_else", &payload, now());

        let response = test_app()
            .oneshot(delivery(&payload, Some(forged)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_event_acknowledged() {
        let payload = json!({
            "id": "evt_2",
            "type": "customer.created",
            "data": {"object": {"id": "cus_1"}}
        })
        .to_string();
        let signature = sign_payload(SECRET, &payload, now());

        let response = test_app()
            .oneshot(delivery(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["received"], true);
    }

    #[tokio::test]
    async fn test_malformed_session_object_rejected() {
        let payload = json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": {"object": {"amount_total": 1500}}
        })
        .to_string();
        let signature = sign_payload(SECRET, &payload, now());

        let response = test_app()
            .oneshot(delivery(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_checkout_event_reaches_order_store() {
        let payload = json!({
            "id": "evt_4",
            "type": "checkout.session.async_payment_failed",
            "data": {"object": {"id": "cs_test_9", "payment_status": "unpaid"}}
        })
        .to_string();
        let signature = sign_payload(SECRET, &payload, now());

        // The test pool never connects, so reaching the store surfaces as a 500.
        let response = test_app()
            .oneshot(delivery(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_session_reads_amount() {
        let session = parse_session(json!({
            "id": "cs_test_1",
            "amount_total": 4999,
            "customer_email": "buyer@example.com"
        }))
        .unwrap();
        assert_eq!(session.amount_total, Some(4999));
    }
}
