//! ShopEase CLI - Browse the catalog, manage a local cart, ask the assistant.
//!
//! # Usage
//!
//! ```bash
//! # List the second page of products
//! shopease products --page 2
//!
//! # Show one product by short or full id
//! shopease product 8123456789
//!
//! # Cart (stored in $SHOPEASE_DATA_DIR/cart.json)
//! shopease cart add 8123456789 -q 2
//! shopease cart set 8123456789 0
//! shopease cart checkout
//!
//! # Assistant
//! shopease chat "Do you have anything for a gift?" --with-catalog --stream
//! shopease chat                      # interactive session
//! shopease recommend "warm socks for hiking"
//! ```
//!
//! Configuration comes from the same environment variables as the
//! storefront server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopease")]
#[command(author, version, about = "ShopEase storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, one page at a time
    Products {
        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Load products incrementally, a batch at a time
    Feed {
        /// Number of batches to load
        #[arg(short, long, default_value_t = 1)]
        batches: usize,
    },
    /// Show one product
    Product {
        /// Full global id or its trailing number
        id: String,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Ask the shopping assistant
    Chat {
        /// Message to send; omit for an interactive session
        message: Option<String>,

        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,

        /// Include a catalog summary in the prompt
        #[arg(long)]
        with_catalog: bool,
    },
    /// Get product recommendations
    Recommend {
        /// What the customer is looking for
        query: String,
    },
    /// Classify the tone of a message
    Sentiment {
        message: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents
    Show,
    /// Add a product
    Add {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Overwrite a line's quantity (0 or less removes it)
    Set {
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Refresh the remote checkout and rebuild it if stale
    Sync,
    /// Print the checkout URL
    Checkout,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopease_storefront=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::from_env()?;

    match cli.command {
        Commands::Products { page } => commands::catalog::list(&ctx, page).await?,
        Commands::Feed { batches } => commands::catalog::feed(&ctx, batches).await?,
        Commands::Product { id } => commands::catalog::show(&ctx, &id).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { id, quantity } => commands::cart::add(&ctx, &id, quantity).await?,
            CartAction::Set { id, quantity } => {
                commands::cart::set_quantity(&ctx, &id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&ctx, &id).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
            CartAction::Sync => commands::cart::sync(&ctx).await?,
            CartAction::Checkout => commands::cart::checkout(&ctx).await?,
        },
        Commands::Chat {
            message,
            stream,
            with_catalog,
        } => commands::assistant::chat(&ctx, message, stream, with_catalog).await?,
        Commands::Recommend { query } => commands::assistant::recommend(&ctx, &query).await?,
        Commands::Sentiment { message } => commands::assistant::sentiment(&ctx, &message).await?,
    }
    Ok(())
}
