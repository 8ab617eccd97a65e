//! The storefront JSON API end to end, with a cookie-keeping visitor.

#![allow(clippy::unwrap_used)]

use futures::future::join_all;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde_json::{Value, json};
use shopease_core::GREETING;
use shopease_integration_tests::{STORE, ScriptedReply, TestApp, catalog};

async fn body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn(catalog(1)).await;

    let response = reqwest::get(app.url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn(catalog(1)).await;

    let response = TestApp::visitor()
        .get(app.url("/health"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me-42");

    let response = reqwest::get(app.url("/health")).await.unwrap();
    assert!(!response.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_product_listing_pages() {
    let app = TestApp::spawn(catalog(30)).await;

    let page = body(reqwest::get(app.url("/products?page=2")).await.unwrap()).await;
    assert_eq!(page["current_page"], 2);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["total_products"], 30);
    assert_eq!(page["has_more_pages"], true);
    assert_eq!(page["products"].as_array().unwrap().len(), 12);
    assert_eq!(page["products"][0]["title"], "Product 13");
    assert_eq!(page["products"][0]["short_id"], "13");

    // Out of range pages clamp
    let last = body(reqwest::get(app.url("/products?page=99")).await.unwrap()).await;
    assert_eq!(last["current_page"], 3);
    assert_eq!(last["has_more_pages"], false);
}

#[tokio::test]
async fn test_product_listing_failure() {
    let app = TestApp::spawn(catalog(3)).await;
    app.shopify.set_failing(true);

    let response = reqwest::get(app.url("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body(response).await["error"],
        "Failed to load products. Please try again later."
    );
}

#[tokio::test]
async fn test_product_detail() {
    let app = TestApp::spawn(catalog(10)).await;

    let product = body(reqwest::get(app.url("/products/7")).await.unwrap()).await;
    assert_eq!(product["id"], "gid://shopify/Product/7");
    assert_eq!(product["title"], "Product 7");

    let response = reqwest::get(app.url("/products/404")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_cart_lives_in_the_session() {
    let app = TestApp::spawn(catalog(3)).await;
    let visitor = TestApp::visitor();

    let cart = body(
        visitor
            .post(app.url("/cart/add"))
            .json(&json!({ "product_id": "2", "quantity": 2 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["item_count"], 2);
    assert_eq!(cart["sync"], "mirrored");
    assert_eq!(cart["lines"][0]["title"], "Product 2");
    assert_eq!(cart["checkout"]["total_quantity"], 2);

    let cart = body(visitor.get(app.url("/cart")).send().await.unwrap()).await;
    assert_eq!(cart["item_count"], 2);
    assert!(cart["sync"].is_null());

    // A second visitor starts empty
    let other = body(TestApp::visitor().get(app.url("/cart")).send().await.unwrap()).await;
    assert_eq!(other["item_count"], 0);
    assert!(other["checkout"].is_null());

    let cart = body(
        visitor
            .post(app.url("/cart/update"))
            .json(&json!({ "product_id": "2", "quantity": 5 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["item_count"], 5);
    assert_eq!(app.shopify.count("UpdateCartLines"), 1);

    let cart = body(
        visitor
            .post(app.url("/cart/remove"))
            .json(&json!({ "product_id": "gid://shopify/Product/2" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["item_count"], 0);
    assert!(cart["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_adds_from_one_visitor_are_all_kept() {
    let app = TestApp::spawn(catalog(9)).await;
    let visitor = TestApp::visitor();

    visitor
        .post(app.url("/cart/add"))
        .json(&json!({ "product_id": "1" }))
        .send()
        .await
        .unwrap();

    let adds = (2..=9).map(|n| {
        visitor
            .post(app.url("/cart/add"))
            .json(&json!({ "product_id": n.to_string() }))
            .send()
    });
    for response in join_all(adds).await {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }

    let cart = body(visitor.get(app.url("/cart")).send().await.unwrap()).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 9);
    assert_eq!(cart["item_count"], 9);
    assert_eq!(cart["checkout"]["total_quantity"], 9);

    // Local cart and remote checkout agree
    let checkout_id = cart["checkout"]["id"].as_str().unwrap();
    let remote: i64 = app
        .shopify
        .cart(checkout_id)
        .unwrap()
        .iter()
        .map(|line| line.quantity)
        .sum();
    assert_eq!(remote, 9);
    assert_eq!(app.shopify.count("CreateCart"), 1);
}

#[tokio::test]
async fn test_cart_line_ids_do_not_match_suffixes() {
    let app = TestApp::spawn(catalog(12)).await;
    let visitor = TestApp::visitor();

    for id in ["11", "1"] {
        visitor
            .post(app.url("/cart/add"))
            .json(&json!({ "product_id": id }))
            .send()
            .await
            .unwrap();
    }

    let cart = body(
        visitor
            .post(app.url("/cart/update"))
            .json(&json!({ "product_id": "1", "quantity": 4 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["lines"][0]["id"], "gid://shopify/Product/11");
    assert_eq!(cart["lines"][0]["quantity"], 1);
    assert_eq!(cart["lines"][1]["quantity"], 4);

    let cart = body(
        visitor
            .post(app.url("/cart/remove"))
            .json(&json!({ "product_id": "1" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let remaining: Vec<&str> = cart["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["id"].as_str().unwrap())
        .collect();
    assert_eq!(remaining, ["gid://shopify/Product/11"]);
}

#[tokio::test]
async fn test_cart_rejects_bad_requests() {
    let app = TestApp::spawn(catalog(3)).await;
    let visitor = TestApp::visitor();

    let response = visitor
        .post(app.url("/cart/add"))
        .json(&json!({ "product_id": "1", "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = visitor
        .post(app.url("/cart/add"))
        .json(&json!({ "product_id": "999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = visitor
        .post(app.url("/cart/update"))
        .json(&json!({ "product_id": "1", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_redirects() {
    let app = TestApp::spawn(catalog(3)).await;
    let visitor = TestApp::visitor();

    let response = visitor.get(app.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/cart");

    let cart = body(
        visitor
            .post(app.url("/cart/add"))
            .json(&json!({ "product_id": "1" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let web_url = cart["checkout"]["web_url"].as_str().unwrap().to_string();

    let response = visitor.get(app.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], web_url.as_str());
}

#[tokio::test]
async fn test_checkout_falls_back_while_shopify_is_down() {
    let app = TestApp::spawn(catalog(3)).await;
    let visitor = TestApp::visitor();

    visitor
        .post(app.url("/cart/add"))
        .json(&json!({ "product_id": "1" }))
        .send()
        .await
        .unwrap();

    app.shopify.set_failing(true);
    let cart = body(
        visitor
            .post(app.url("/cart/update"))
            .json(&json!({ "product_id": "1", "quantity": 3 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cart["sync"], "diverged");
    assert_eq!(cart["checkout"]["stale"], true);
    assert_eq!(cart["item_count"], 3);

    let response = visitor.get(app.url("/checkout")).send().await.unwrap();
    assert_eq!(
        response.headers()[LOCATION],
        format!("https://{STORE}/cart").as_str()
    );

    // Once Shopify is back, checkout rebuilds the session from the cart
    app.shopify.set_failing(false);
    let response = visitor.get(app.url("/checkout")).send().await.unwrap();
    let location = response.headers()[LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with(&format!("https://{STORE}/cart/c/")));

    let cart = body(visitor.get(app.url("/cart")).send().await.unwrap()).await;
    assert_eq!(cart["checkout"]["stale"], false);
    assert_eq!(cart["checkout"]["total_quantity"], 3);
}

#[tokio::test]
async fn test_chat_round_trip() {
    let app = TestApp::spawn(catalog(3)).await;
    let visitor = TestApp::visitor();

    let transcript = body(visitor.get(app.url("/chat")).send().await.unwrap()).await;
    assert_eq!(transcript[0]["text"], GREETING);

    app.gemini.push(ScriptedReply::text("We stock three products."));
    let response = body(
        visitor
            .post(app.url("/chat"))
            .json(&json!({ "message": "What do you sell?", "with_catalog": true }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(response["reply"], "We stock three products.");
    assert_eq!(response["messages"].as_array().unwrap().len(), 3);

    let prompt = app.gemini.last_call().unwrap().prompt().to_string();
    assert!(prompt.contains("Product 1 ($19.99 USD); Product 2"));
    assert!(prompt.contains("2-3 sentences"));

    let transcript = body(visitor.get(app.url("/chat")).send().await.unwrap()).await;
    assert_eq!(transcript.as_array().unwrap().len(), 3);
    assert_eq!(transcript[1]["role"], "user");
    assert_eq!(transcript[2]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let app = TestApp::spawn(catalog(1)).await;
    let visitor = TestApp::visitor();

    for path in ["/chat", "/chat/stream"] {
        let response = visitor
            .post(app.url(path))
            .json(&json!({ "message": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
    assert!(app.gemini.calls().is_empty());
}

#[tokio::test]
async fn test_chat_stream_events_and_transcript() {
    let app = TestApp::spawn(catalog(1)).await;
    let visitor = TestApp::visitor();
    app.gemini.push(ScriptedReply::chunks(&["Hello", " there"]));

    let response = visitor
        .post(app.url("/chat/stream"))
        .json(&json!({ "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let events = response.text().await.unwrap();
    let hello = events.find("data: Hello").unwrap();
    let there = events.find("data:  there").unwrap();
    assert!(hello < there);
    assert!(events.contains("event: done"));

    let transcript = body(visitor.get(app.url("/chat")).send().await.unwrap()).await;
    assert_eq!(transcript.as_array().unwrap().len(), 3);
    assert_eq!(transcript[2]["text"], "Hello there");
}

#[tokio::test]
async fn test_recommend_and_sentiment() {
    let app = TestApp::spawn(catalog(3)).await;
    let client = TestApp::visitor();

    app.gemini.push(ScriptedReply::text("1. Product 2"));
    let response = body(
        client
            .post(app.url("/chat/recommend"))
            .json(&json!({ "query": "something blue" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(response["recommendation"], "1. Product 2");

    let response = body(
        client
            .post(app.url("/chat/recommend"))
            .json(&json!({ "query": "  " }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(response["recommendation"].is_null());

    app.gemini.push(ScriptedReply::text("negative"));
    let response = body(
        client
            .post(app.url("/chat/sentiment"))
            .json(&json!({ "message": "My order never arrived" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(response["sentiment"], "negative");
}
