//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` envelopes with `reqwest` 0.13 for HTTP.
//! Caches product pages using `moka` (5-minute TTL).

mod cache;
mod conversions;

pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use shopease_core::CheckoutSession;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    CheckoutLineInput, CheckoutLineUpdate, ProductPage, join_user_errors,
};
use crate::shopify::{CatalogGateway, GraphQLError, ShopifyError};

use cache::{CacheValue, ProductsKey};
use conversions::{convert_cart, convert_product_page, convert_user_errors};
use queries::fragments::{CartLineInput, CartPayload};
use queries::{
    AddToCart, CreateCart, GetCart, GetProducts, RemoveFromCart, UpdateCartLines, add_to_cart,
    create_cart, get_cart, get_products, remove_from_cart, update_cart_lines,
};

/// Header carrying the public Storefront API token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides product listing and cart operations. Product pages are cached
/// for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: Cache<ProductsKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig, timeout: Duration) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.endpoint(),
                access_token: config.storefront_token.clone(),
                cache,
            }),
        })
    }

    /// The GraphQL endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::missing(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::missing("No data in response")
        })
    }

    /// Invalidate all cached product pages.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Unwrap a cart mutation payload into a checkout session.
fn into_session(payload: Option<CartPayload>, action: &str) -> Result<CheckoutSession, ShopifyError> {
    if let Some(result) = payload {
        if !result.user_errors.is_empty() {
            return Err(ShopifyError::UserError(join_user_errors(
                &convert_user_errors(result.user_errors),
            )));
        }

        if let Some(cart) = result.cart {
            return Ok(convert_cart(cart));
        }
    }

    Err(ShopifyError::missing(format!("Failed to {action}")))
}

fn line_inputs(lines: Vec<CheckoutLineInput>) -> Vec<CartLineInput> {
    lines
        .into_iter()
        .map(|line| CartLineInput {
            merchandise_id: line.variant_id,
            quantity: i64::from(line.quantity),
        })
        .collect()
}

// =============================================================================
// CatalogGateway
// =============================================================================

impl CatalogGateway for StorefrontClient {
    #[instrument(skip(self))]
    async fn fetch_products(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<ProductPage, ShopifyError> {
        let cache_key = ProductsKey {
            first,
            after: after.clone(),
        };

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let data = self
            .execute::<GetProducts>(get_products::Variables { first, after })
            .await?;

        let page = convert_product_page(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    async fn create_checkout(
        &self,
        lines: Vec<CheckoutLineInput>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines: line_inputs(lines),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        into_session(data.cart_create, "create cart")
    }

    #[instrument(skip(self, lines), fields(checkout_id = %checkout_id))]
    async fn add_checkout_lines(
        &self,
        checkout_id: &str,
        lines: Vec<CheckoutLineInput>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: checkout_id.to_string(),
            lines: line_inputs(lines),
        };

        let data = self.execute::<AddToCart>(variables).await?;
        into_session(data.cart_lines_add, "add to cart")
    }

    #[instrument(skip(self, lines), fields(checkout_id = %checkout_id))]
    async fn update_checkout_lines(
        &self,
        checkout_id: &str,
        lines: Vec<CheckoutLineUpdate>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: checkout_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| update_cart_lines::CartLineUpdateInput {
                    id: line.line_id,
                    quantity: i64::from(line.quantity),
                })
                .collect(),
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        into_session(data.cart_lines_update, "update cart")
    }

    #[instrument(skip(self, line_ids), fields(checkout_id = %checkout_id))]
    async fn remove_checkout_lines(
        &self,
        checkout_id: &str,
        line_ids: Vec<String>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let variables = remove_from_cart::Variables {
            cart_id: checkout_id.to_string(),
            line_ids,
        };

        let data = self.execute::<RemoveFromCart>(variables).await?;
        into_session(data.cart_lines_remove, "remove from cart")
    }

    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    async fn get_checkout(
        &self,
        checkout_id: &str,
    ) -> Result<Option<CheckoutSession>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: checkout_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;
        Ok(data.cart.map(convert_cart))
    }
}
