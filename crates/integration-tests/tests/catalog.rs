//! Catalog loading, paging and product resolution over HTTP.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;
use shopease_integration_tests::{FakeShopify, catalog, product_node};
use shopease_storefront::services::catalog::{
    CatalogBrowser, FEED_BATCH, LOAD_FAILED, ProductFeed, fetch_all,
};
use shopease_storefront::services::resolver::resolve_product;
use shopease_storefront::shopify::StorefrontClient;

fn client(shop: &FakeShopify) -> StorefrontClient {
    StorefrontClient::new(&shop.config(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_all_follows_every_page() {
    let shop = FakeShopify::start(catalog(80)).await;

    let entries = fetch_all(&client(&shop)).await.unwrap();

    assert_eq!(entries.len(), 80);
    let ids: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 80);
    assert_eq!(entries[0].id, "gid://shopify/Product/1");
    assert_eq!(entries[79].id, "gid://shopify/Product/80");
    // 50 + 30
    assert_eq!(shop.count("GetProducts"), 2);
}

#[tokio::test]
async fn test_fetch_all_keeps_first_of_repeated_ids() {
    let mut products: Vec<Value> = catalog(2);
    products.push(product_node(1, "Product 1 again", "5.00"));
    let shop = FakeShopify::start(products).await;

    let entries = fetch_all(&client(&shop)).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Product 1");
}

#[tokio::test]
async fn test_browser_pages_locally() {
    let shop = FakeShopify::start(catalog(30)).await;

    let mut browser = CatalogBrowser::load(&client(&shop), 12).await;

    assert!(browser.error().is_none());
    assert_eq!(browser.total_pages(), 3);
    assert_eq!(browser.current().len(), 12);
    assert_eq!(browser.set_page(3), 3);
    assert_eq!(browser.current().len(), 6);
    assert_eq!(browser.next_page(), 3);
    assert_eq!(browser.set_page(0), 1);

    // Paging never goes back to the network
    assert_eq!(shop.count("GetProducts"), 1);
}

#[tokio::test]
async fn test_browser_reports_load_failure() {
    let shop = FakeShopify::start(catalog(5)).await;
    shop.set_failing(true);

    let browser = CatalogBrowser::load(&client(&shop), 12).await;

    assert_eq!(browser.error(), Some(LOAD_FAILED));
    assert!(browser.entries().is_empty());
    assert_eq!(browser.total_pages(), 0);
}

#[tokio::test]
async fn test_feed_loads_in_batches() {
    let shop = FakeShopify::start(catalog(30)).await;
    let batch = usize::try_from(FEED_BATCH).unwrap();
    let mut feed = ProductFeed::new(client(&shop));

    assert_eq!(feed.load_more().await, batch);
    assert!(feed.has_more());
    assert_eq!(feed.load_more().await, batch);
    assert_eq!(feed.load_more().await, 30 - 2 * batch);
    assert!(!feed.has_more());

    // Exhausted: no further requests
    assert_eq!(feed.load_more().await, 0);
    assert_eq!(feed.entries().len(), 30);
    assert_eq!(shop.count("GetProducts"), 3);
}

#[tokio::test]
async fn test_feed_recovers_after_error() {
    let shop = FakeShopify::start(catalog(20)).await;
    let mut feed = ProductFeed::new(client(&shop));

    shop.set_failing(true);
    assert_eq!(feed.load_more().await, 0);
    assert!(feed.error().is_some());
    assert!(feed.has_more());

    shop.set_failing(false);
    assert!(feed.load_more().await > 0);
    assert!(feed.error().is_none());
}

#[tokio::test]
async fn test_resolve_by_full_and_short_id() {
    let shop = FakeShopify::start(catalog(12)).await;
    let entries = fetch_all(&client(&shop)).await.unwrap();

    let by_gid = resolve_product("gid://shopify/Product/12", &entries).unwrap();
    assert_eq!(by_gid.title, "Product 12");

    let by_short = resolve_product("12", &entries).unwrap();
    assert_eq!(by_short.id, by_gid.id);

    let encoded = resolve_product("gid%3A%2F%2Fshopify%2FProduct%2F7", &entries).unwrap();
    assert_eq!(encoded.title, "Product 7");

    assert!(resolve_product("999", &entries).is_none());
    assert!(resolve_product("", &entries).is_none());
}
