//! Gemini client and shopping assistant against the loopback Gemini fake.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures::StreamExt;
use shopease_core::{ChatRole, GREETING};
use shopease_integration_tests::{API_KEY, FakeGemini, ScriptedReply};
use shopease_storefront::gemini::{
    AssistantGateway, GeminiClient, GeminiError, GenerationOptions, Reply,
};
use shopease_storefront::services::assistant::{
    BLOCKED_REPLY, CONFIGURATION_ERROR, GENERIC_FAILURE, SERVICE_UNAVAILABLE, STREAM_FAILURE,
    Sentiment, ShoppingAssistant,
};
use shopease_storefront::services::chat::ChatSession;

fn client(gemini: &FakeGemini) -> GeminiClient {
    GeminiClient::new(&gemini.config(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_generate_sends_key_and_options() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::text("Try the walking socks."));

    let reply = client(&gemini)
        .generate("hello".to_string(), GenerationOptions::CHAT)
        .await
        .unwrap();
    assert_eq!(reply, Reply::Text("Try the walking socks.".to_string()));

    let call = gemini.last_call().unwrap();
    assert_eq!(call.method, "gemini-test:generateContent");
    assert_eq!(call.api_key.as_deref(), Some(API_KEY));
    assert_eq!(call.prompt(), "hello");
    assert_eq!(call.body["generationConfig"]["maxOutputTokens"], 1024);
    assert_eq!(call.body["safetySettings"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_sentiment_sends_no_safety_settings() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::text("Positive."));

    let assistant = ShoppingAssistant::new(client(&gemini));
    assert_eq!(assistant.sentiment("Love it!").await, Sentiment::Positive);

    let call = gemini.last_call().unwrap();
    assert!(call.body.get("safetySettings").is_none());
    assert_eq!(call.body["generationConfig"]["maxOutputTokens"], 50);
    assert!(call.prompt().contains("Message: \"Love it!\""));
}

#[tokio::test]
async fn test_generate_maps_error_statuses() {
    let gemini = FakeGemini::start().await;
    let client = client(&gemini);

    gemini.push(ScriptedReply::error(429, "RESOURCE_EXHAUSTED", "Quota exceeded"));
    let err = client
        .generate("q".to_string(), GenerationOptions::CHAT)
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::RateLimited(_)), "{err:?}");
    assert!(err.is_quota());

    gemini.push(ScriptedReply::error(400, "INVALID_ARGUMENT", "API key not valid."));
    let err = client
        .generate("q".to_string(), GenerationOptions::CHAT)
        .await
        .unwrap_err();
    assert!(err.is_configuration(), "{err:?}");

    gemini.push(ScriptedReply::error(500, "INTERNAL", "Backend hiccup"));
    let err = client
        .generate("q".to_string(), GenerationOptions::CHAT)
        .await
        .unwrap_err();
    assert!(!err.is_configuration() && !err.is_quota(), "{err:?}");
}

#[tokio::test]
async fn test_chat_reply_failures_become_messages() {
    let gemini = FakeGemini::start().await;
    let assistant = ShoppingAssistant::new(client(&gemini));

    gemini.push(ScriptedReply::error(403, "PERMISSION_DENIED", "Forbidden"));
    assert_eq!(assistant.chat_reply("hi", "").await, CONFIGURATION_ERROR);

    gemini.push(ScriptedReply::error(429, "RESOURCE_EXHAUSTED", "Quota exceeded"));
    assert_eq!(assistant.chat_reply("hi", "").await, SERVICE_UNAVAILABLE);

    gemini.push(ScriptedReply::error(500, "INTERNAL", "Backend hiccup"));
    assert_eq!(assistant.chat_reply("hi", "").await, GENERIC_FAILURE);

    gemini.push(ScriptedReply::Blocked);
    assert_eq!(assistant.chat_reply("hi", "").await, BLOCKED_REPLY);
}

#[tokio::test]
async fn test_stream_yields_chunks_in_order() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::chunks(&["We have ", "three ", "mugs."]));

    let chunks: Vec<String> = client(&gemini)
        .generate_stream("mugs?".to_string(), GenerationOptions::CHAT)
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(chunks, ["We have ", "three ", "mugs."]);
    let call = gemini.last_call().unwrap();
    assert!(call.is_stream());
}

#[tokio::test]
async fn test_streamed_chat_fills_transcript() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::chunks(&["Hello", ", shopper"]));

    let mut chat = ChatSession::new(client(&gemini));
    let mut seen = Vec::new();
    let reply = chat
        .submit_streaming("  hi  ", "Mug ($12.50 USD)", |chunk| seen.push(chunk.to_string()))
        .await;

    assert_eq!(reply.as_deref(), Some("Hello, shopper"));
    assert_eq!(seen, ["Hello", ", shopper"]);

    let messages = chat.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].text, GREETING);
    assert_eq!(messages[1].role, ChatRole::User);
    assert_eq!(messages[1].text, "hi");
    assert_eq!(messages[2].role, ChatRole::Assistant);

    // Streamed prompts drop the sentence limit and carry the catalog
    let prompt = gemini.last_call().unwrap().prompt().to_string();
    assert!(prompt.contains("Here are our available products: Mug ($12.50 USD)"));
    assert!(prompt.contains("User question: hi"));
    assert!(!prompt.contains("2-3 sentences"));
}

#[tokio::test]
async fn test_broken_stream_keeps_partial_text() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::Broken(vec!["Partial".to_string()]));

    let mut chat = ChatSession::new(client(&gemini));
    let reply = chat.submit_streaming("hi", "", |_| {}).await.unwrap();

    assert_eq!(reply, format!("Partial{STREAM_FAILURE}"));
}

#[tokio::test]
async fn test_blocked_stream_apologises() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::Blocked);

    let mut chat = ChatSession::new(client(&gemini));
    let reply = chat.submit_streaming("hi", "", |_| {}).await.unwrap();

    assert_eq!(reply, BLOCKED_REPLY);
}

#[tokio::test]
async fn test_stream_open_failure_is_a_message() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::error(401, "UNAUTHENTICATED", "Bad key"));

    let mut chat = ChatSession::new(client(&gemini));
    let reply = chat.submit_streaming("hi", "", |_| {}).await.unwrap();

    assert_eq!(reply, CONFIGURATION_ERROR);
    assert_eq!(chat.transcript().len(), 3);
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let gemini = FakeGemini::start().await;

    let mut chat = ChatSession::new(client(&gemini));
    assert!(chat.submit("   ", "").await.is_none());
    assert!(chat.submit_streaming("", "", |_| {}).await.is_none());

    assert!(gemini.calls().is_empty());
    assert_eq!(chat.transcript().len(), 1);
}

#[tokio::test]
async fn test_recommend_lists_catalog() {
    let gemini = FakeGemini::start().await;
    gemini.push(ScriptedReply::text("1. Mug"));

    let assistant = ShoppingAssistant::new(client(&gemini));
    let entry = shopease_core::CatalogEntry {
        id: "gid://shopify/Product/1".to_string(),
        title: "Mug".to_string(),
        description: String::new(),
        handle: "mug".to_string(),
        price: rust_decimal::Decimal::new(1250, 2),
        currency: "USD".to_string(),
        image: None,
        image_alt: String::new(),
        variant_id: String::new(),
        available_for_sale: true,
    };

    let text = assistant.recommend(&[entry], "coffee").await;
    assert_eq!(text.as_deref(), Some("1. Mug"));

    let call = gemini.last_call().unwrap();
    assert!(call.prompt().contains("- Mug ($12.50 USD): No description"));
    assert!(call.prompt().contains("Customer is looking for: \"coffee\""));
    assert_eq!(call.body["generationConfig"]["maxOutputTokens"], 512);
}
