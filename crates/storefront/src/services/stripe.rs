//! Stripe REST client.
//!
//! Only the two pieces the checkout needs: creating a Checkout Session from a
//! hand-off, and verifying the `Stripe-Signature` header on webhooks.
//!
//! # Signature scheme
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`. The signed payload
//! is `"{t}.{raw body}"`, HMAC-SHA256 with the endpoint secret. Any matching
//! `v1` entry is accepted; timestamps outside the tolerance are rejected.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, instrument};

use streamstick_core::CurrencyCode;
use streamstick_core::checkout::CheckoutHandoff;

use crate::config::StripeConfig;

/// Maximum age of a webhook signature, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Errors talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The fields of a Checkout Session this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

impl CheckoutSession {
    /// Whether Stripe reports the payment as collected.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    webhook_secret: SecretString,
    currency: CurrencyCode,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            currency: config.currency,
        }
    }

    /// Create a Checkout Session for the hand-off.
    ///
    /// One line item per cart item, priced at the hand-off's unit price.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` for a non-2xx answer, `StripeError::Http`
    /// for transport failures.
    #[instrument(skip(self, handoff), fields(items = handoff.items.len(), total = %handoff.total))]
    pub async fn create_checkout_session(
        &self,
        handoff: &CheckoutHandoff,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params = self.checkout_params(handoff, success_url, cancel_url);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |b| b.error.message,
            );
            error!(status = %status, message = %message, "Stripe rejected checkout session");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn checkout_params(
        &self,
        handoff: &CheckoutHandoff,
        success_url: &str,
        cancel_url: &str,
    ) -> Vec<(String, String)> {
        let customer = &handoff.customer_info;
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            (
                "customer_email".to_string(),
                customer.email.as_str().to_string(),
            ),
            ("metadata[customer_name]".to_string(), customer.name.clone()),
        ];

        for (i, item) in handoff.items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
            params.push((
                format!("{prefix}[price_data][currency]"),
                self.currency.as_str().to_string(),
            ));
            params.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.price.cents().to_string(),
            ));
            params.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("{prefix}[price_data][product_data][metadata][product_id]"),
                item.id.to_string(),
            ));
            if let Some(image) = &item.image {
                params.push((
                    format!("{prefix}[price_data][product_data][images][0]"),
                    image.clone(),
                ));
            }
        }

        params
    }

    /// Verify a webhook delivery and parse its event.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidSignature` if the header is missing parts,
    /// stale, or does not match, `StripeError::Parse` if the body is not an
    /// event.
    pub fn verify_webhook(
        &self,
        payload: &str,
        signature_header: &str,
    ) -> Result<WebhookEvent, StripeError> {
        verify_signature(
            self.webhook_secret.expose_secret().as_bytes(),
            payload,
            signature_header,
            chrono::Utc::now().timestamp(),
        )?;
        Ok(serde_json::from_str(payload)?)
    }
}

/// Check a `Stripe-Signature` header against `payload` at time `now`.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` on any mismatch.
pub fn verify_signature(
    secret: &[u8],
    payload: &str,
    header: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".into()))?;
    if candidates.is_empty() {
        return Err(StripeError::InvalidSignature("missing v1 signature".into()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("invalid timestamp".into()))?;
    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    let matched = candidates
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
    if matched {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature("signature mismatch".into()))
    }
}

/// Build a valid header for `payload`. Test helper shared with route tests.
#[cfg(test)]
pub(crate) fn sign_payload(secret: &[u8], payload: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use streamstick_core::cart::{Cart, CartItem};
    use streamstick_core::catalog::ProductCategory;
    use streamstick_core::checkout::CustomerInfo;
    use streamstick_core::{Email, Price, ProductId};

    use super::*;

    const SECRET: &[u8] = b"whsec_test_signing";

    fn handoff() -> CheckoutHandoff {
        let mut cart = Cart::new();
        cart.add_item(CartItem {
            id: ProductId::new("iptv-12-month"),
            name: "12 Month IPTV".to_string(),
            price: Price::from_cents(8999),
            image: None,
            quantity: 1,
            category: ProductCategory::Iptv,
        });
        CheckoutHandoff::from_cart(
            &cart,
            CustomerInfo {
                email: Email::parse("viewer@example.com").unwrap(),
                name: "Sam Viewer".to_string(),
                phone: None,
                shipping: None,
            },
        )
        .unwrap()
    }

    fn client(api_base: &str) -> StripeClient {
        StripeClient::new(&StripeConfig {
            secret_key: SecretString::from("sk_test_abc"),
            webhook_secret: SecretString::from("whsec_test_signing"),
            currency: CurrencyCode::Usd,
            api_base: api_base.to_string(),
        })
    }

    #[test]
    fn test_verify_signature_accepts_valid_header() {
        let now = Utc::now().timestamp();
        let header = sign_payload(SECRET, r#"{"id":"evt_1"}"#, now);
        assert!(verify_signature(SECRET, r#"{"id":"evt_1"}"#, &header, now).is_ok());
    }

    #[test]
    fn test_verify_signature_accepts_any_matching_v1() {
        let now = 1_700_000_000;
        let valid = sign_payload(SECRET, "body", now);
        let good_sig = valid.split_once("v1=").unwrap().1;
        let header = format!("t={now},v1=deadbeef,v1={good_sig}");
        assert!(verify_signature(SECRET, "body", &header, now).is_ok());
    }

    #[test]
    fn test_verify_signature_rejects_tampered_body() {
        let now = 1_700_000_000;
        let header = sign_payload(SECRET, "original", now);
        assert!(matches!(
            verify_signature(SECRET, "tampered", &header, now),
            Err(StripeError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_verify_signature_rejects_stale_timestamp() {
        let signed_at = 1_700_000_000;
        let header = sign_payload(SECRET, "body", signed_at);
        let later = signed_at + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verify_signature(SECRET, "body", &header, later).is_err());
    }

    #[test]
    fn test_verify_signature_rejects_malformed_header() {
        assert!(verify_signature(SECRET, "body", "", 0).is_err());
        assert!(verify_signature(SECRET, "body", "t=abc,v1=00", 0).is_err());
        assert!(verify_signature(SECRET, "body", "t=0", 0).is_err());
    }

    #[test]
    fn test_verify_signature_rejects_extreme_timestamps() {
        let now = 1_700_000_000;
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert!(matches!(
                verify_signature(SECRET, "body", header, now),
                Err(StripeError::InvalidSignature(msg)) if msg == "timestamp outside tolerance"
            ));
        }
    }

    #[test]
    fn test_checkout_params_use_handoff_prices() {
        let params = client("http://unused").checkout_params(&handoff(), "https://s", "https://c");
        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("mode"), Some("payment"));
        assert_eq!(lookup("line_items[0][price_data][unit_amount]"), Some("8999"));
        assert_eq!(lookup("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(lookup("customer_email"), Some("viewer@example.com"));
    }

    #[tokio::test]
    async fn test_create_checkout_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("unit_amount%5D=8999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "amount_total": 8999
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server.uri())
            .create_checkout_session(&handoff(), "https://s", "https://c")
            .await
            .unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.amount_total, Some(8999));
    }

    #[tokio::test]
    async fn test_create_checkout_session_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Invalid currency" }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .create_checkout_session(&handoff(), "https://s", "https://c")
            .await
            .unwrap_err();
        assert!(
            matches!(err, StripeError::Api { status: 400, ref message } if message == "Invalid currency")
        );
    }
}
