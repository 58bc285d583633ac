//! Larkspur CLI - Catalog seeding and role management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the product catalog from a YAML file
//! lark-cli seed products -f catalog.yaml
//!
//! # Replace the catalog entirely
//! lark-cli seed products -f catalog.yaml --clear
//!
//! # Grant the admin role to an account
//! lark-cli role set -e owner@example.com -r admin
//! ```
//!
//! # Commands
//!
//! - `seed products` - Insert catalog rows through the service-role key
//! - `role set` - Set the role on a profile row, looked up by email

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lark-cli")]
#[command(author, version, about = "Larkspur CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed remote tables
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed the product catalog from a YAML file
    Products {
        /// Path to the YAML catalog file
        #[arg(short, long)]
        file: String,

        /// Delete all existing products first
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Set the role on a user's profile
    Set {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role to assign (`admin`, `user`)
        #[arg(short, long, default_value = "admin")]
        role: String,
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
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, clear } => {
                commands::seed::products(&file, clear).await?;
            }
        },
        Commands::Role { action } => match action {
            RoleAction::Set { email, role } => {
                commands::role::set(&email, &role).await?;
            }
        },
    }
    Ok(())
}
