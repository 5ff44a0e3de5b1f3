//! Storefront CLI - Browse, fill the cart and buy from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shop products --category laptops
//! shop products --min-price 49999
//!
//! # Manage the cart (persisted under SHOP_DATA_DIR)
//! shop cart add 5
//! shop cart
//!
//! # Sign in and buy
//! shop login -e shopper@example.com
//! shop buy 5
//! ```
//!
//! # Commands
//!
//! - `products` / `product` - List and inspect catalog products
//! - `cart` - Show, add, remove, clear
//! - `buy` - Run the purchase flow for one cart item
//! - `login` / `logout` / `whoami` - Account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront::config::StorefrontConfig;
use storefront::error::AppError;
use storefront::state::AppState;
use storefront_core::{Price, ProductId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod terminal;

use commands::products::ListingQuery;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally filtered
    Products {
        /// Only this category (mobiles, laptops, tablets)
        #[arg(short, long)]
        category: Option<String>,

        /// Only products priced at or above this amount
        #[arg(short, long)]
        min_price: Option<Price>,

        /// Case-insensitive title search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product and related products
    Product {
        /// Product id
        id: String,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Buy one item from the cart
    Buy {
        /// Product id of the cart item
        id: String,
    },
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a catalog product to the cart
    Add {
        /// Product id
        id: String,
    },
    /// Remove an item from the cart
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so they never mix with command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront=warn,storefront_cli=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match AppState::from_config(&config) {
        Ok(state) => run(cli, &state).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        e.capture();
        report(&e.user_message());
        std::process::exit(1);
    }
}

#[allow(clippy::print_stderr)]
fn report(message: &str) {
    eprintln!("{message}");
}

async fn run(cli: Cli, state: &AppState) -> Result<(), AppError> {
    match cli.command {
        Commands::Products {
            category,
            min_price,
            search,
        } => commands::products::list(
            state,
            &ListingQuery {
                category,
                min_price,
                search,
            },
        )?,
        Commands::Product { id } => commands::products::show(state, &ProductId::new(id))?,
        Commands::Cart { action } => match action {
            None => commands::cart::show(state)?,
            Some(CartAction::Add { id }) => commands::cart::add(state, &ProductId::new(id))?,
            Some(CartAction::Remove { id }) => {
                commands::cart::remove(state, &ProductId::new(id))?;
            }
            Some(CartAction::Clear) => commands::cart::clear(state)?,
        },
        Commands::Buy { id } => {
            let outcome = commands::cart::buy(state, &ProductId::new(id)).await?;
            tracing::debug!(?outcome, "Purchase flow finished");
        }
        Commands::Login { email } => commands::account::login(state, &email).await?,
        Commands::Logout => commands::account::logout(state).await,
        Commands::Whoami => commands::account::whoami(state),
    }
    Ok(())
}
