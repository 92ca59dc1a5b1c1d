//! One call surface for API reads and writes, routed by build mode.
//!
//! - `Development`: every call is an HTTP request to the local dev server.
//! - `Production`: GETs of the read-only catalog paths are answered straight
//!   from the database through a [`DirectReader`], skipping the network.
//!   Everything else is an HTTP request to the configured API base URL.
//!
//! Non-2xx answers are returned as responses for the caller to inspect.
//! Transport and database errors propagate. There is no retry.

mod direct;

use std::future::Future;

use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use streamstick_core::catalog::ProductCategory;

use crate::config::{ConfigError, get_env_or_default, parse_env};
use crate::db::RepositoryError;

pub use direct::PgDirectReader;

/// Which routing table the gateway uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown build mode: {other}")),
        }
    }
}

/// Gateway settings.
///
/// - `STREAMSTICK_BUILD_MODE` - `development` (default) or `production`
/// - `STREAMSTICK_DEV_ORIGIN` - dev server origin (default: `http://127.0.0.1:3000`)
/// - `STREAMSTICK_API_BASE_URL` - production API base (default: `https://streamstickpro.com`)
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: BuildMode,
    pub dev_origin: String,
    pub api_base_url: String,
}

impl GatewayConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for an unknown build mode or a
    /// base URL that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mode = parse_env("STREAMSTICK_BUILD_MODE", "development")?;
        let dev_origin = get_env_or_default("STREAMSTICK_DEV_ORIGIN", "http://127.0.0.1:3000");
        let api_base_url =
            get_env_or_default("STREAMSTICK_API_BASE_URL", "https://streamstickpro.com");

        for (key, value) in [
            ("STREAMSTICK_DEV_ORIGIN", &dev_origin),
            ("STREAMSTICK_API_BASE_URL", &api_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        }

        Ok(Self {
            mode,
            dev_origin: dev_origin.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Gateway failures. Non-2xx statuses are not errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("direct read failed: {0}")]
    Direct(#[from] RepositoryError),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Per-call options, mirroring the subset of fetch options the callers use.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// `None` means GET.
    pub method: Option<Method>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Some(Method::POST),
            body: Some(body),
            headers: Vec::new(),
        }
    }

    fn is_get(&self) -> bool {
        self.method.as_ref().is_none_or(|m| m == Method::GET)
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Direct,
}

/// A fetch-style response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
    pub source: ResponseSource,
}

impl GatewayResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// A read the gateway can answer without the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectRead {
    Products { category: Option<ProductCategory> },
    BlogPosts,
}

impl DirectRead {
    /// Match an endpoint against the read-only paths. The query string does
    /// not affect matching; a `category` parameter narrows product reads.
    #[must_use]
    pub fn match_endpoint(endpoint: &str) -> Option<Self> {
        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        match path.trim_end_matches('/') {
            "/api/products" => {
                let category = url::form_urlencoded::parse(query.as_bytes())
                    .find(|(k, _)| k == "category")
                    .and_then(|(_, v)| v.parse().ok());
                Some(Self::Products { category })
            }
            "/api/blog/posts" => Some(Self::BlogPosts),
            _ => None,
        }
    }
}

/// Source of direct (non-network) reads.
pub trait DirectReader: Send + Sync {
    /// Produce the JSON body the HTTP endpoint would have returned.
    fn read(
        &self,
        request: &DirectRead,
    ) -> impl Future<Output = Result<serde_json::Value, GatewayError>> + Send;
}

/// The gateway itself.
#[derive(Debug, Clone)]
pub struct ApiGateway<R> {
    config: GatewayConfig,
    client: reqwest::Client,
    reader: Option<R>,
}

impl<R: DirectReader> ApiGateway<R> {
    /// Without a reader, production reads fall through to HTTP.
    #[must_use]
    pub fn new(config: GatewayConfig, reader: Option<R>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            reader,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> BuildMode {
        self.config.mode
    }

    /// Issue a request for `endpoint` (a path starting with `/`).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidEndpoint` for an endpoint that is not an
    /// absolute path, `GatewayError::Http` or `GatewayError::Direct` when the
    /// underlying call fails.
    #[instrument(skip(self, options), fields(mode = ?self.config.mode))]
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<GatewayResponse, GatewayError> {
        if !endpoint.starts_with('/') || endpoint.starts_with("//") {
            return Err(GatewayError::InvalidEndpoint(endpoint.to_string()));
        }

        match self.config.mode {
            BuildMode::Development => self.http(&self.config.dev_origin, endpoint, options).await,
            BuildMode::Production => {
                if options.is_get()
                    && let Some(read) = DirectRead::match_endpoint(endpoint)
                    && let Some(reader) = &self.reader
                {
                    debug!(?read, "Answering from the database");
                    let body = reader.read(&read).await?;
                    return Ok(GatewayResponse {
                        status: 200,
                        body: serde_json::to_string(&body)?,
                        source: ResponseSource::Direct,
                    });
                }
                self.http(&self.config.api_base_url, endpoint, options)
                    .await
            }
        }
    }

    async fn http(
        &self,
        base: &str,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<GatewayResponse, GatewayError> {
        let method = options.method.unwrap_or(Method::GET);
        let mut request = self.client.request(method, format!("{base}{endpoint}"));
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(GatewayResponse {
            status,
            body,
            source: ResponseSource::Network,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Clone, Default)]
    struct StubReader {
        calls: Arc<AtomicUsize>,
    }

    impl DirectReader for StubReader {
        async fn read(&self, request: &DirectRead) -> Result<serde_json::Value, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match request {
                DirectRead::Products { category } => {
                    serde_json::json!([{ "id": "direct", "category": category }])
                }
                DirectRead::BlogPosts => serde_json::json!([]),
            })
        }
    }

    fn gateway(mode: BuildMode, base: &str, reader: &StubReader) -> ApiGateway<StubReader> {
        ApiGateway::new(
            GatewayConfig {
                mode,
                dev_origin: base.to_string(),
                api_base_url: base.to_string(),
            },
            Some(reader.clone()),
        )
    }

    #[test]
    fn test_match_endpoint() {
        assert_eq!(
            DirectRead::match_endpoint("/api/products"),
            Some(DirectRead::Products { category: None })
        );
        assert_eq!(
            DirectRead::match_endpoint("/api/products?category=iptv&utm=x"),
            Some(DirectRead::Products {
                category: Some(ProductCategory::Iptv)
            })
        );
        assert_eq!(
            DirectRead::match_endpoint("/api/blog/posts?page=2"),
            Some(DirectRead::BlogPosts)
        );
        assert_eq!(DirectRead::match_endpoint("/api/products/fire-stick"), None);
        assert_eq!(DirectRead::match_endpoint("/api/track"), None);
    }

    #[test]
    fn test_build_mode_from_str() {
        assert_eq!("production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("DEV".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert!("staging".parse::<BuildMode>().is_err());
    }

    #[tokio::test]
    async fn test_development_always_uses_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let reader = StubReader::default();
        let response = gateway(BuildMode::Development, &server.uri(), &reader)
            .request("/api/products", RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_production_reads_bypass_network() {
        // No mocks mounted: any HTTP call would get a 404.
        let server = MockServer::start().await;
        let reader = StubReader::default();
        let response = gateway(BuildMode::Production, &server.uri(), &reader)
            .request("/api/products?category=firestick", RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.source, ResponseSource::Direct);
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body[0]["category"], "firestick");
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_production_writes_go_to_api_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/track"))
            .and(body_json(serde_json::json!({ "event": "add_to_cart" })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let reader = StubReader::default();
        let response = gateway(BuildMode::Production, &server.uri(), &reader)
            .request(
                "/api/track",
                RequestOptions::post_json(serde_json::json!({ "event": "add_to_cart" })),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_production_post_to_read_path_uses_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let reader = StubReader::default();
        let response = gateway(BuildMode::Production, &server.uri(), &reader)
            .request(
                "/api/products",
                RequestOptions::post_json(serde_json::json!({})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 405);
        assert!(!response.is_success());
        assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_rejected() {
        let reader = StubReader::default();
        let gw = gateway(BuildMode::Development, "http://127.0.0.1:9", &reader);
        assert!(matches!(
            gw.request("api/products", RequestOptions::default()).await,
            Err(GatewayError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            gw.request("//evil.example/x", RequestOptions::default()).await,
            Err(GatewayError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let reader = StubReader::default();
        let result = gateway(BuildMode::Development, "http://127.0.0.1:9", &reader)
            .request("/api/products", RequestOptions::default())
            .await;
        assert!(matches!(result, Err(GatewayError::Http(_))));
    }
}
