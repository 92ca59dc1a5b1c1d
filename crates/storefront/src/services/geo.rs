//! Best-effort IP geolocation for tracking rows.
//!
//! Lookups are bounded by a hard timeout and never fail the caller: any
//! error yields an empty [`GeoLocation`].

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use streamstick_core::analytics::{GeoLocation, clamp_field};

/// Hard upper bound on a lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Response fields of the common free geolocation APIs.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default, alias = "country_name")]
    country: Option<String>,
    #[serde(default, alias = "regionName", alias = "region_name")]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// Client for an HTTP geolocation endpoint.
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    url_template: String,
}

impl GeoClient {
    /// Create a client for `url_template`, in which `{ip}` is replaced by the
    /// address being looked up.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url_template: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(url_template, LOOKUP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        url_template: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url_template: url_template.into(),
        })
    }

    /// Resolve `ip` to a coarse location. Private and loopback addresses are
    /// not looked up.
    #[instrument(skip(self))]
    pub async fn lookup(&self, ip: IpAddr) -> GeoLocation {
        if !is_public(ip) {
            return GeoLocation::default();
        }

        let url = self.url_template.replace("{ip}", &ip.to_string());
        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<GeoResponse>()
                .await
        }
        .await;

        match result {
            Ok(geo) => GeoLocation {
                country: geo.country.as_deref().map(clamp_field),
                region: geo.region.as_deref().map(clamp_field),
                city: geo.city.as_deref().map(clamp_field),
            },
            Err(e) => {
                debug!(error = %e, "Geolocation lookup failed");
                GeoLocation::default()
            }
        }
    }
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PUBLIC_IP: &str = "203.0.113.7";

    #[tokio::test]
    async fn test_lookup_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{PUBLIC_IP}/json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "country_name": "Canada",
                "region": "Ontario",
                "city": "Toronto"
            })))
            .mount(&server)
            .await;

        let client = GeoClient::new(format!("{}/{{ip}}/json", server.uri())).unwrap();
        let geo = client.lookup(PUBLIC_IP.parse().unwrap()).await;
        assert_eq!(geo.country.as_deref(), Some("Canada"));
        assert_eq!(geo.region.as_deref(), Some("Ontario"));
        assert_eq!(geo.city.as_deref(), Some("Toronto"));
    }

    #[tokio::test]
    async fn test_lookup_times_out_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "country": "Nowhere" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = GeoClient::with_timeout(
            format!("{}/{{ip}}", server.uri()),
            Duration::from_millis(100),
        )
        .unwrap();
        let geo = client.lookup(PUBLIC_IP.parse().unwrap()).await;
        assert_eq!(geo, GeoLocation::default());
    }

    #[tokio::test]
    async fn test_lookup_skips_private_addresses() {
        // No server at this address; a request would fail the expectations.
        let client = GeoClient::new("http://127.0.0.1:9/{ip}").unwrap();
        assert_eq!(
            client.lookup("192.168.1.10".parse().unwrap()).await,
            GeoLocation::default()
        );
        assert_eq!(
            client.lookup("127.0.0.1".parse().unwrap()).await,
            GeoLocation::default()
        );
    }
}
