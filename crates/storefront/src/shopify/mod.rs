//! Shopify Storefront API gateway.
//!
//! # Architecture
//!
//! - Request and response envelopes come from the `graphql_client` crate;
//!   query documents and their serde shapes live in [`storefront::queries`]
//! - The local cart is the source of truth; the remote cart is a mirror
//!   kept in sync by [`crate::services::cart::CartSynchronizer`]
//! - In-memory caching via `moka` for product pages (5 minute TTL)
//!
//! The Cart API (`cartCreate`, `cartLinesAdd`, ...) backs the checkout
//! session. Its `checkoutUrl` is the hosted checkout the buyer is sent to.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopease_storefront::shopify::{CatalogGateway, CheckoutLineInput, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify, config.http_timeout)?;
//!
//! let page = client.fetch_products(50, None).await?;
//! let entry = &page.entries[0];
//!
//! let session = client
//!     .create_checkout(vec![CheckoutLineInput::new(&entry.variant_id, 1)])
//!     .await?;
//! println!("{}", session.web_url);
//! ```

mod storefront;
pub mod types;

use std::future::Future;

pub use storefront::StorefrontClient;
pub use types::*;

use shopease_core::CheckoutSession;
use thiserror::Error;

/// Errors that can occur when interacting with the Shopify API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// Single-message GraphQL error for responses that carry no usable data.
    pub(crate) fn missing(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// CatalogGateway
// =============================================================================

/// Remote catalog and checkout operations.
///
/// [`StorefrontClient`] is the production implementation. Services are
/// generic over this trait so they can run against in-process fakes.
pub trait CatalogGateway: Send + Sync {
    /// Fetch one page of products.
    fn fetch_products(
        &self,
        first: i64,
        after: Option<String>,
    ) -> impl Future<Output = Result<ProductPage, ShopifyError>> + Send;

    /// Create a checkout session seeded with `lines`.
    fn create_checkout(
        &self,
        lines: Vec<CheckoutLineInput>,
    ) -> impl Future<Output = Result<CheckoutSession, ShopifyError>> + Send;

    /// Add lines to an existing checkout session.
    fn add_checkout_lines(
        &self,
        checkout_id: &str,
        lines: Vec<CheckoutLineInput>,
    ) -> impl Future<Output = Result<CheckoutSession, ShopifyError>> + Send;

    /// Overwrite quantities of existing checkout lines.
    fn update_checkout_lines(
        &self,
        checkout_id: &str,
        lines: Vec<CheckoutLineUpdate>,
    ) -> impl Future<Output = Result<CheckoutSession, ShopifyError>> + Send;

    /// Remove checkout lines by remote line id.
    fn remove_checkout_lines(
        &self,
        checkout_id: &str,
        line_ids: Vec<String>,
    ) -> impl Future<Output = Result<CheckoutSession, ShopifyError>> + Send;

    /// Fetch a checkout session. `None` when it no longer exists remotely.
    fn get_checkout(
        &self,
        checkout_id: &str,
    ) -> impl Future<Output = Result<Option<CheckoutSession>, ShopifyError>> + Send;
}
