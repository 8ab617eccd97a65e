//! Product detail resolution from route ids.
//!
//! Routes carry either a full Shopify global id or just its trailing
//! number. Each entry is tested against every matcher in [`MATCHERS`]
//! order, and the first entry that any matcher accepts wins.

use shopease_core::{CatalogEntry, PRODUCT_GID_PREFIX};

/// A pure predicate over `(entry id, route id)`.
pub type Matcher = fn(&str, &str) -> bool;

/// Matching strategies, tried in order for each entry.
pub const MATCHERS: &[Matcher] = &[exact, gid_suffix, id_suffix, url_decoded];

/// Exact id equality.
#[must_use]
pub fn exact(id: &str, route_id: &str) -> bool {
    id == route_id
}

/// Last path segment of a product global id.
#[must_use]
pub fn gid_suffix(id: &str, route_id: &str) -> bool {
    id.contains(PRODUCT_GID_PREFIX) && id.rsplit('/').next() == Some(route_id)
}

/// Id equals, or ends with, the route id.
#[must_use]
pub fn id_suffix(id: &str, route_id: &str) -> bool {
    id == route_id || id.ends_with(route_id)
}

/// Percent-decoded route id equals the id.
#[must_use]
pub fn url_decoded(id: &str, route_id: &str) -> bool {
    urlencoding::decode(route_id).is_ok_and(|decoded| decoded == id)
}

/// Whether any matcher accepts `id` for `route_id`. An empty route id
/// never matches.
#[must_use]
pub fn matches(id: &str, route_id: &str) -> bool {
    !route_id.is_empty() && MATCHERS.iter().any(|matcher| matcher(id, route_id))
}

/// Find the entry a route id refers to.
///
/// `None` is the not-found state, not an error. An empty route id never
/// matches.
#[must_use]
pub fn resolve_product<'a>(route_id: &str, entries: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    entries.iter().find(|entry| matches(&entry.id, route_id))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn entry(id: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            handle: String::new(),
            price: Decimal::ONE,
            currency: "USD".to_string(),
            image: None,
            image_alt: String::new(),
            variant_id: String::new(),
            available_for_sale: false,
        }
    }

    #[test]
    fn test_exact() {
        assert!(exact("gid://shopify/Product/1", "gid://shopify/Product/1"));
        assert!(!exact("gid://shopify/Product/1", "1"));
    }

    #[test]
    fn test_gid_suffix() {
        assert!(gid_suffix("gid://shopify/Product/123", "123"));
        assert!(!gid_suffix("gid://shopify/Product/123", "23"));
        assert!(!gid_suffix("gid://shopify/Collection/123", "123"));
    }

    #[test]
    fn test_id_suffix() {
        assert!(id_suffix("gid://shopify/Product/123", "23"));
        assert!(id_suffix("abc", "abc"));
        assert!(!id_suffix("gid://shopify/Product/123", "124"));
    }

    #[test]
    fn test_url_decoded() {
        assert!(url_decoded(
            "gid://shopify/Product/123",
            "gid%3A%2F%2Fshopify%2FProduct%2F123"
        ));
        assert!(!url_decoded("gid://shopify/Product/123", "%ZZ"));
    }

    #[test]
    fn test_resolve_short_id() {
        let entries = vec![entry("gid://shopify/Product/7"), entry("gid://shopify/Product/123")];
        let found = resolve_product("123", &entries).expect("found");
        assert_eq!(found.id, "gid://shopify/Product/123");
    }

    #[test]
    fn test_resolve_encoded_id() {
        let entries = vec![entry("gid://shopify/Product/123")];
        assert!(resolve_product("gid%3A%2F%2Fshopify%2FProduct%2F123", &entries).is_some());
    }

    #[test]
    fn test_first_matching_entry_wins() {
        // "23" is a suffix of the first entry's id
        let entries = vec![entry("gid://shopify/Product/123"), entry("gid://shopify/Product/23")];
        let found = resolve_product("23", &entries).expect("found");
        assert_eq!(found.id, "gid://shopify/Product/123");
    }

    #[test]
    fn test_not_found() {
        let entries = vec![entry("gid://shopify/Product/1")];
        assert!(resolve_product("999", &entries).is_none());
        assert!(resolve_product("", &entries).is_none());
        assert!(resolve_product("1", &[]).is_none());
    }
}
