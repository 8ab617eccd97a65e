//! Cache types for Storefront API responses.

use crate::shopify::types::ProductPage;

/// Cache key for product pages.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ProductsKey {
    pub first: i64,
    pub after: Option<String>,
}

/// Cached value types.
///
/// Carts are never cached; they are mutable remote state.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(ProductPage),
}
