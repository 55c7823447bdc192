//! Barbaro Nutrition CLI - Catalog checks and cart maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Validate the product catalog
//! bn-cli catalog check --catalog crates/storefront/catalog.yaml
//!
//! # Inspect a persisted cart
//! bn-cli cart show --store-dir ./carts
//!
//! # Add two units of a product
//! bn-cli cart add --store-dir ./carts --catalog crates/storefront/catalog.yaml \
//!     --product whey-isolate-1kg --quantity 2
//!
//! # Set an absolute quantity (zero or negative removes the line)
//! bn-cli cart update --store-dir ./carts --product whey-isolate-1kg --quantity 5
//! ```
//!
//! # Commands
//!
//! - `catalog check` - Load and validate a catalog file
//! - `cart show|add|update|remove|clear` - Edit carts in a storefront cart directory

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use barbaro_core::ProductId;

use crate::commands::cart::CartTarget;

mod commands;

#[derive(Parser)]
#[command(name = "bn-cli")]
#[command(author, version, about = "Barbaro Nutrition CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect and edit persisted carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Load and validate a catalog file
    Check {
        /// Path to the catalog YAML file
        #[arg(short, long, default_value = "crates/storefront/catalog.yaml")]
        catalog: PathBuf,
    },
}

#[derive(Args)]
struct CartArgs {
    /// Directory holding persisted carts
    #[arg(short, long)]
    store_dir: PathBuf,

    /// Visitor cart token (defaults to the single shared cart)
    #[arg(long)]
    cart: Option<Uuid>,
}

impl CartArgs {
    fn target(self) -> CartTarget {
        CartTarget {
            store_dir: self.store_dir,
            token: self.cart,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show {
        #[command(flatten)]
        target: CartArgs,

        /// Catalog to read the display currency from
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// Add a catalog product to the cart
    Add {
        #[command(flatten)]
        target: CartArgs,

        /// Path to the catalog YAML file
        #[arg(short, long, default_value = "crates/storefront/catalog.yaml")]
        catalog: PathBuf,

        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line
    Update {
        #[command(flatten)]
        target: CartArgs,

        /// Product ID
        #[arg(short, long)]
        product: String,

        /// New quantity; zero or negative removes the line
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line from the cart
    Remove {
        #[command(flatten)]
        target: CartArgs,

        /// Product ID
        #[arg(short, long)]
        product: String,
    },
    /// Empty the cart
    Clear {
        #[command(flatten)]
        target: CartArgs,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Check { catalog } => {
                commands::catalog::check(&catalog)?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { target, catalog } => {
                commands::cart::show(&target.target(), catalog.as_deref())?;
            }
            CartAction::Add {
                target,
                catalog,
                product,
                quantity,
            } => {
                commands::cart::add(
                    &target.target(),
                    &catalog,
                    &ProductId::new(product),
                    quantity,
                )?;
            }
            CartAction::Update {
                target,
                product,
                quantity,
            } => {
                commands::cart::update(&target.target(), &ProductId::new(product), quantity)?;
            }
            CartAction::Remove { target, product } => {
                commands::cart::remove(&target.target(), &ProductId::new(product))?;
            }
            CartAction::Clear { target } => {
                commands::cart::clear(&target.target())?;
            }
        },
    }
    Ok(())
}
