//! Send a tracking beacon through the gateway.
//!
//! Useful for checking the tracking pipeline end to end against a running
//! storefront. Writes always go over HTTP.

use serde_json::json;

use streamstick_storefront::gateway::RequestOptions;

use super::catalog::{gateway, print_response};

/// `ssp-cli track --visitor <uuid> --path <path> [--event <name>]`
///
/// Without `--event` a page view is sent.
///
/// # Errors
///
/// Returns an error if the gateway call fails or answers non-2xx.
pub async fn send(
    visitor: &str,
    path: &str,
    event: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, body) = event.map_or_else(
        || {
            (
                "/api/track-view",
                json!({ "visitor_session_id": visitor, "path": path }),
            )
        },
        |event| {
            (
                "/api/track",
                json!({ "visitor_session_id": visitor, "event": event, "path": path }),
            )
        },
    );

    let response = gateway()?
        .request(endpoint, RequestOptions::post_json(body))
        .await?;
    print_response(&response)
}
