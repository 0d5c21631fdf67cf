//! Tamarind CLI - Terminal client for the Tamarind store.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! tam-cli register -u bobook -p learnbyheart
//! tam-cli login -u bobook -p learnbyheart
//!
//! # Browse the catalog
//! tam-cli products
//! tam-cli products --search "running shoes"
//!
//! # Edit the cart
//! tam-cli cart add KCRwjF7lN97HnEaY
//! tam-cli cart set KCRwjF7lN97HnEaY 3
//! tam-cli cart show
//! ```
//!
//! # Commands
//!
//! - `register` / `login` / `logout` - Account and session management
//! - `products` - List or search the catalog
//! - `cart` - Show and edit the cart (requires login)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tamarind_storefront::StorefrontConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tam-cli")]
#[command(author, version, about = "Terminal client for the Tamarind store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Account username (at least 6 characters)
        #[arg(short, long)]
        username: String,

        /// Account password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Repeat of the password; defaults to the password itself
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log in and persist the session for later commands
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// List the product catalog
    Products {
        /// Narrow the listing to matches for this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product identifier from the catalog listing
        product_id: String,
    },
    /// Raise a product's quantity by one
    Inc {
        /// Product identifier from the catalog listing
        product_id: String,
    },
    /// Lower a product's quantity by one; zero removes it
    Dec {
        /// Product identifier from the catalog listing
        product_id: String,
    },
    /// Set a product to an absolute quantity; zero removes it
    Set {
        /// Product identifier from the catalog listing
        product_id: String,

        /// Desired quantity
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product identifier from the catalog listing
        product_id: String,
    },
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tam_cli=info,tamarind_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), commands::CliError> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Register {
            username,
            password,
            confirm_password,
        } => {
            commands::auth::register(&config, &username, &password, confirm_password.as_deref())
                .await?;
        }
        Commands::Login { username, password } => {
            commands::auth::login(&config, &username, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&config).await?,
        Commands::Products { search } => commands::products::list(&config, search).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&config).await?,
            CartAction::Add { product_id } => {
                commands::cart::add(&config, product_id.into()).await?;
            }
            CartAction::Inc { product_id } => {
                commands::cart::increment(&config, product_id.into()).await?;
            }
            CartAction::Dec { product_id } => {
                commands::cart::decrement(&config, product_id.into()).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => {
                commands::cart::set(&config, product_id.into(), quantity).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(&config, product_id.into()).await?;
            }
        },
    }
    Ok(())
}
