//! CLI command implementations.

pub mod assistant;
pub mod cart;
pub mod catalog;

use std::io::Write;

use shopease_core::CatalogEntry;
use shopease_storefront::config::{ConfigError, StorefrontConfig};
use shopease_storefront::gemini::GeminiClient;
use shopease_storefront::services::cart::CartError;
use shopease_storefront::shopify::{ShopifyError, StorefrontClient};
use shopease_storefront::state::{AppState, StateError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] StateError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Catalog(String),
}

/// Configuration and API clients shared by every command.
pub struct Context {
    state: AppState,
}

impl Context {
    /// Load configuration and build the API clients.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        let config = StorefrontConfig::from_env()?;
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    pub fn config(&self) -> &StorefrontConfig {
        self.state.config()
    }

    pub fn storefront(&self) -> &StorefrontClient {
        self.state.storefront()
    }

    pub fn gemini(&self) -> &GeminiClient {
        self.state.gemini()
    }
}

/// One-line product summary: `short id  title  price`.
pub fn write_entry(out: &mut impl Write, entry: &CatalogEntry) -> std::io::Result<()> {
    let availability = if entry.available_for_sale {
        ""
    } else {
        "  (sold out)"
    };
    writeln!(
        out,
        "{:>14}  {}  {}{availability}",
        entry.short_id(),
        entry.title,
        entry.money().display()
    )
}
