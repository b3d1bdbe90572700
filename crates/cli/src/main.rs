//! Larkspur CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! lark-cli migrate
//!
//! # Seed a sample catalog (categories, products, a demo admin)
//! lark-cli seed
//!
//! # Promote a user to admin in the local mirror
//! lark-cli admin grant -e staff@larkspurgoods.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with a sample catalog
//! - `admin grant` / `admin revoke` - Change a user's role locally

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
    /// Run database migrations
    Migrate,
    /// Seed the database with a sample catalog
    Seed,
    /// Manage user roles in the local mirror
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin role to a user by email
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the admin role from a user by email
    Revoke {
        /// User email address
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => {
                commands::admin::set_role(&email, larkspur_core::UserRole::Admin).await?;
            }
            AdminAction::Revoke { email } => {
                commands::admin::set_role(&email, larkspur_core::UserRole::Customer).await?;
            }
        },
    }
    Ok(())
}
