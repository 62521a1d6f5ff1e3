//! Ellectra CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ellectra-cli migrate
//!
//! # Load categories and products from a YAML file
//! ellectra-cli seed catalog crates/cli/seed/catalog.yaml
//!
//! # Issue an access token for local testing
//! ellectra-cli token issue -e admin@ellectra.in -n "Store Admin"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed catalog` - Seed the catalog from YAML
//! - `token issue` - Print a signed access token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ellectra-cli")]
#[command(author, version, about = "Ellectra CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create categories and products from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token signed with `ELLECTRA_TOKEN_SECRET`
    Issue {
        /// Email address the token is issued for
        #[arg(short, long)]
        email: String,

        /// Display name carried in the token
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::Token { action } => match action {
            TokenAction::Issue { email, name } => commands::token::issue(&email, &name)?,
        },
    }
    Ok(())
}
