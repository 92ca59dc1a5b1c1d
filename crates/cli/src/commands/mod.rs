pub mod catalog;
pub mod migrate;
pub mod seed;
pub mod track;

use secrecy::SecretString;

/// `DATABASE_URL`, falling back to `STOREFRONT_DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("STOREFRONT_DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")
}
