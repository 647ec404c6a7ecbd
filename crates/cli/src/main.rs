//! Smart Shop CLI - migrations, catalog seeding and order management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! shop-cli migrate
//!
//! # Create or update categories and products from a YAML file
//! shop-cli seed crates/cli/seed/catalog.yaml
//!
//! # Move an order along its lifecycle (notifies the customer)
//! shop-cli order 42 confirm
//! shop-cli order 42 ship
//! shop-cli order 42 deliver
//!
//! # Business dashboard
//! shop-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};

use smart_shop_core::{OrderId, StaffAction};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Smart Shop operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create or update the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Confirm, ship or deliver an order
    Order {
        /// Order ID
        id: OrderId,
        /// What happened to the order
        #[arg(value_enum)]
        action: OrderAction,
    },
    /// Show order, revenue and stock figures
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderAction {
    Confirm,
    Ship,
    Deliver,
}

impl From<OrderAction> for StaffAction {
    fn from(action: OrderAction) -> Self {
        match action {
            OrderAction::Confirm => Self::Confirm,
            OrderAction::Ship => Self::Ship,
            OrderAction::Deliver => Self::Deliver,
        }
    }
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file } => commands::seed::run(&file).await,
        Commands::Order { id, action } => commands::orders::advance(id, action.into()).await,
        Commands::Stats => commands::orders::stats().await,
    }
}
