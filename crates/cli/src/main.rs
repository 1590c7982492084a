//! Devgon CLI - migrations, catalog seeding and role management.
//!
//! # Usage
//!
//! ```bash
//! # Apply the storefront schema and the session table
//! devgon-cli migrate
//!
//! # Load medicines from a YAML file (existing names are skipped)
//! devgon-cli seed catalog -f catalog.yaml
//!
//! # Grant or revoke back-office access
//! devgon-cli admin promote -e owner@devgon.in
//! devgon-cli admin demote -e owner@devgon.in
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use devgon_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "devgon-cli")]
#[command(author, version, about = "Devgon CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage administrator roles
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Add medicines from a YAML file
    Catalog {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give a registered user the admin role
    Promote {
        /// The user's email address
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin to the user role
    Demote {
        /// The user's email address
        #[arg(short, long)]
        email: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => {
                commands::admin::set_role(&email, UserRole::Admin).await?;
            }
            AdminAction::Demote { email } => {
                commands::admin::set_role(&email, UserRole::User).await?;
            }
        },
    }
    Ok(())
}
