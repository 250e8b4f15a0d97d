//! ComelonesFit CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (storefront tables + session store)
//! cf-cli migrate
//!
//! # Seed the product catalog from a YAML file
//! cf-cli seed products --file products.yaml
//!
//! # Same, deleting products the file no longer lists
//! cf-cli seed products --file products.yaml --prune
//!
//! # Show the configured role assignments
//! cf-cli admin audit
//!
//! # Order counts and revenue by status
//! cf-cli metrics
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(author, version, about = "ComelonesFit CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed database tables
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Administrative inspection
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Order counts and revenue by status
    Metrics,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert products from a YAML file
    Products {
        /// Path to the YAML product list
        #[arg(short, long)]
        file: PathBuf,
        /// Delete products missing from the file
        #[arg(long)]
        prune: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print the configured owner and admin role assignments
    Audit,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, prune } => commands::seed::products(&file, prune).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Audit => commands::admin::audit()?,
        },
        Commands::Metrics => commands::metrics::run().await?,
    }
    Ok(())
}
