//! CedarMarket CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cm-cli migrate
//!
//! # Grant or revoke the admin role
//! cm-cli admin grant -e admin@example.com
//! cm-cli admin revoke -e admin@example.com
//!
//! # List registered users
//! cm-cli users list
//!
//! # Seed the catalog with demo products
//! cm-cli seed
//! ```
//!
//! Every command reads `DATABASE_URL` from the environment (a `.env` file
//! is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cm-cli")]
#[command(author, version, about = "CedarMarket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Inspect user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Seed the catalog with demo products
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin role to a user
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the admin role from a user
    Revoke {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List every registered user
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cm_cli=info,cedarmarket_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Admin {
            action: AdminAction::Grant { email },
        } => commands::admin::set_admin(&email, true).await,
        Commands::Admin {
            action: AdminAction::Revoke { email },
        } => commands::admin::set_admin(&email, false).await,
        Commands::Users {
            action: UsersAction::List,
        } => commands::users::list().await,
        Commands::Seed => commands::seed::run().await,
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e}");
        std::process::exit(1);
    }
}
