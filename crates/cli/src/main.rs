//! Green Aura CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! ga-cli migrate
//!
//! # Seed demo farms and products
//! ga-cli seed crates/cli/seed/farms.yaml
//!
//! # Create a verified account
//! ga-cli user create -e owner@example.com -n "Sunrise Farm" -r organization -p 'long-password'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Load farms and products from YAML
//! - `user create` - Create verified accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ga-cli")]
#[command(author, version, about = "Green Aura CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed farms and products from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(default_value = "crates/cli/seed/farms.yaml")]
        file: String,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a verified user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name (also the farm name for organization accounts)
        #[arg(short, long)]
        name: String,

        /// Account role (`customer`, `organization`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => commands::user::create(&email, &name, &role, &password).await?,
        },
    }
    Ok(())
}
