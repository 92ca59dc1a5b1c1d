//! Catalog reads through the API gateway.
//!
//! In production mode (`STREAMSTICK_BUILD_MODE=production`) with a reachable
//! database, reads are answered straight from Postgres; otherwise they go over
//! HTTP to the configured origin.

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use streamstick_core::catalog::ProductCategory;
use streamstick_storefront::gateway::{
    ApiGateway, BuildMode, GatewayConfig, GatewayResponse, PgDirectReader, RequestOptions,
};

/// Build a gateway, with a database reader when production mode has a URL.
pub(crate) fn gateway() -> Result<ApiGateway<PgDirectReader>, Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_env()?;

    let reader = match (config.mode, super::database_url()) {
        (BuildMode::Production, Ok(url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_lazy(url.expose_secret())?;
            Some(PgDirectReader::new(pool))
        }
        (BuildMode::Production, Err(_)) => {
            warn!("No DATABASE_URL; production reads will use HTTP");
            None
        }
        (BuildMode::Development, _) => None,
    };

    Ok(ApiGateway::new(config, reader))
}

pub(crate) fn print_response(response: &GatewayResponse) -> Result<(), Box<dyn std::error::Error>> {
    info!(status = response.status, source = ?response.source, "Gateway response");

    let pretty = response
        .json::<serde_json::Value>()
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| response.body.clone());

    #[allow(clippy::print_stdout)]
    {
        println!("{pretty}");
    }

    if response.is_success() {
        Ok(())
    } else {
        Err(format!("request failed with status {}", response.status).into())
    }
}

/// `ssp-cli catalog products [--category <c>]`
///
/// # Errors
///
/// Returns an error if the gateway call fails or answers non-2xx.
pub async fn products(category: Option<ProductCategory>) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = category.map_or_else(
        || "/api/products".to_string(),
        |c| format!("/api/products?category={}", c.as_str()),
    );
    let response = gateway()?.request(&endpoint, RequestOptions::default()).await?;
    print_response(&response)
}

/// `ssp-cli catalog posts`
///
/// # Errors
///
/// Returns an error if the gateway call fails or answers non-2xx.
pub async fn posts() -> Result<(), Box<dyn std::error::Error>> {
    let response = gateway()?
        .request("/api/blog/posts", RequestOptions::default())
        .await?;
    print_response(&response)
}
