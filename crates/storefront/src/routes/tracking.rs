//! Visitor tracking beacons.
//!
//! The write happens in a spawned task after `202 Accepted` is returned, so a
//! slow geolocation lookup or a database outage never delays the page.

use std::net::IpAddr;

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use serde::Deserialize;
use tracing::{Instrument, Span, instrument, warn};

use streamstick_core::VisitorSessionId;
use streamstick_core::analytics::{GeoLocation, PageView, TrackEvent, clamp_field, normalize_path};

use crate::db::TrackingRepository;
use crate::middleware::client_ip;
use crate::state::AppState;

/// Body of `POST /api/track`.
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub visitor_session_id: VisitorSessionId,
    pub event: String,
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

impl From<TrackRequest> for TrackEvent {
    fn from(req: TrackRequest) -> Self {
        Self {
            session_id: req.visitor_session_id,
            event: clamp_field(&req.event),
            path: normalize_path(&req.path),
            referrer: req.referrer.as_deref().map(clamp_field),
            properties: req
                .properties
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
        }
    }
}

/// Body of `POST /api/track-view`.
#[derive(Debug, Deserialize)]
pub struct PageViewRequest {
    pub visitor_session_id: VisitorSessionId,
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<PageViewRequest> for PageView {
    fn from(req: PageViewRequest) -> Self {
        Self {
            session_id: req.visitor_session_id,
            path: normalize_path(&req.path),
            referrer: req.referrer.as_deref().map(clamp_field),
            title: req.title.as_deref().map(clamp_field),
        }
    }
}

async fn locate(state: &AppState, ip: Option<IpAddr>) -> GeoLocation {
    match (state.geo(), ip) {
        (Some(geo), Some(ip)) => geo.lookup(ip).await,
        _ => GeoLocation::default(),
    }
}

/// `POST /api/track`
#[instrument(skip_all, fields(event = %body.event))]
pub async fn track_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TrackRequest>,
) -> StatusCode {
    let event = TrackEvent::from(body);
    let ip = client_ip(&headers);

    tokio::spawn(
        async move {
            let geo = locate(&state, ip).await;
            if let Err(e) = TrackingRepository::new(state.pool())
                .record_event(&event, &geo)
                .await
            {
                warn!(error = %e, "Failed to record visitor event");
            }
        }
        .instrument(Span::current()),
    );

    StatusCode::ACCEPTED
}

/// `POST /api/track-view`
#[instrument(skip_all, fields(path = %body.path))]
pub async fn track_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PageViewRequest>,
) -> StatusCode {
    let view = PageView::from(body);
    let ip = client_ip(&headers);

    tokio::spawn(
        async move {
            let geo = locate(&state, ip).await;
            if let Err(e) = TrackingRepository::new(state.pool())
                .record_page_view(&view, &geo)
                .await
            {
                warn!(error = %e, "Failed to record page view");
            }
        }
        .instrument(Span::current()),
    );

    StatusCode::ACCEPTED
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::test_support::TestClient;

    const VISITOR: &str = "5f0c2a9e-3c1b-4b7e-9a55-0e8d6f1c2b3a";

    #[tokio::test]
    async fn test_event_accepted_even_without_database() {
        let mut client = TestClient::new();
        let response = client
            .json(
                "POST",
                "/api/track",
                &json!({
                    "visitor_session_id": VISITOR,
                    "event": "add_to_cart",
                    "path": "/products/fire-stick-4k?utm_source=x"
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_page_view_accepted() {
        let mut client = TestClient::new();
        let response = client
            .json(
                "POST",
                "/api/track-view",
                &json!({"visitor_session_id": VISITOR, "path": "/", "title": "Home"}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_visitor_id_rejected() {
        let mut client = TestClient::new();
        let response = client
            .json(
                "POST",
                "/api/track",
                &json!({"visitor_session_id": "nope", "event": "x", "path": "/"}),
            )
            .await;
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_request_is_normalized() {
        let event = TrackEvent::from(TrackRequest {
            visitor_session_id: VISITOR.parse().unwrap(),
            event: "  begin_checkout ".to_string(),
            path: "checkout?step=2".to_string(),
            referrer: Some("x".repeat(2000)),
            properties: None,
        });
        assert_eq!(event.event, "begin_checkout");
        assert_eq!(event.path, "/checkout");
        assert_eq!(event.referrer.unwrap().len(), 512);
        assert_eq!(event.properties, json!({}));
    }
}
