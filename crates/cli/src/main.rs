//! StreamStick Pro CLI - migrations, seeding and gateway calls.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ssp-cli migrate
//!
//! # Upsert products and blog posts from YAML
//! ssp-cli seed catalog.yaml
//!
//! # Read the catalog through the API gateway
//! ssp-cli catalog products --category iptv
//! ssp-cli catalog posts
//!
//! # Send a tracking beacon
//! ssp-cli track --visitor 5f0c2a9e-3c1b-4b7e-9a55-0e8d6f1c2b3a --path / --event add_to_cart
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use streamstick_core::catalog::ProductCategory;
use streamstick_core::VisitorSessionId;

mod commands;

#[derive(Parser)]
#[command(name = "ssp-cli")]
#[command(author, version, about = "StreamStick Pro CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Upsert products and blog posts from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Read the catalog through the API gateway
    Catalog {
        #[command(subcommand)]
        target: CatalogTarget,
    },
    /// Send a visitor event or page view
    Track {
        /// Visitor session id (UUID)
        #[arg(long)]
        visitor: VisitorSessionId,

        /// Page path
        #[arg(long, default_value = "/")]
        path: String,

        /// Event name; sends a page view when omitted
        #[arg(long)]
        event: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogTarget {
    /// Active products
    Products {
        /// `firestick`, `iptv` or `accessory`
        #[arg(long)]
        category: Option<ProductCategory>,
    },
    /// Published blog posts
    Posts,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Catalog { target } => match target {
            CatalogTarget::Products { category } => commands::catalog::products(category).await?,
            CatalogTarget::Posts => commands::catalog::posts().await?,
        },
        Commands::Track {
            visitor,
            path,
            event,
        } => commands::track::send(&visitor.to_string(), &path, event.as_deref()).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_track() {
        let cli = Cli::try_parse_from([
            "ssp-cli",
            "track",
            "--visitor",
            "5f0c2a9e-3c1b-4b7e-9a55-0e8d6f1c2b3a",
            "--event",
            "add_to_cart",
        ])
        .map_err(|e| e.to_string());
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Track { event: Some(_), .. })
        ));
        assert!(Cli::try_parse_from(["ssp-cli", "track", "--visitor", "nope"]).is_err());
    }

    #[test]
    fn test_parse_category() {
        assert!(Cli::try_parse_from(["ssp-cli", "catalog", "products", "--category", "iptv"]).is_ok());
        assert!(Cli::try_parse_from(["ssp-cli", "catalog", "products", "--category", "tv"]).is_err());
    }
}
