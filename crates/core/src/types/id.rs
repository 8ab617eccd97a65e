//! Shopify global ids.
//!
//! Catalog identifiers are long structured strings such as
//! `gid://shopify/Product/8123456789`, while routes and the CLI show only the
//! trailing numeric part.

/// Namespace prefix carried by every product id.
pub const PRODUCT_GID_PREFIX: &str = "gid://shopify/Product/";

/// Short display id for a product.
///
/// Product global ids yield their last path segment; anything else is
/// returned unchanged.
///
/// ```
/// use shopease_core::short_id;
///
/// assert_eq!(short_id("gid://shopify/Product/123"), "123");
/// assert_eq!(short_id("plain-id"), "plain-id");
/// ```
#[must_use]
pub fn short_id(id: &str) -> &str {
    if id.contains(PRODUCT_GID_PREFIX) {
        id.rsplit('/').next().unwrap_or(id)
    } else {
        id
    }
}
