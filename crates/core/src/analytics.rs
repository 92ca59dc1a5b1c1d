//! Visitor tracking events.

use serde::{Deserialize, Serialize};

use crate::VisitorSessionId;

/// Maximum stored length of free-text tracking fields.
pub const MAX_FIELD_LEN: usize = 512;

/// A named interaction (add to cart, begin checkout, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    /// Value of the client's `visitor_session_id`.
    pub session_id: VisitorSessionId,
    pub event: String,
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
}

/// A page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub session_id: VisitorSessionId,
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Coarse location resolved from the visitor's IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// Trim a free-text field to [`MAX_FIELD_LEN`] characters.
#[must_use]
pub fn clamp_field(value: &str) -> String {
    value.trim().chars().take(MAX_FIELD_LEN).collect()
}

/// Normalize a tracked path: drop the query string and fragment, ensure a
/// leading slash.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let path = clamp_field(path);
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
