//! Loopback fakes shared by the ShopEase integration tests.
//!
//! [`FakeShopify`] answers the Storefront API operations the client sends,
//! dispatching on `operationName` and keeping carts in memory.
//! [`FakeGemini`] answers `generateContent` and `streamGenerateContent`
//! from a queue of scripted replies and records every prompt it sees.
//!
//! [`TestApp`] runs the full storefront router against both.
//!
//! Everything binds to `127.0.0.1:0`, so tests can run in parallel.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support: a poisoned lock or a failed bind should abort the test
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path as UrlPath, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use shopease_storefront::config::{
    CatalogConfig, GeminiConfig, ShopifyStorefrontConfig, StorefrontConfig,
};
use shopease_storefront::state::AppState;
use tokio::net::TcpListener;

/// Store domain every fake config points at.
pub const STORE: &str = "test-shop.myshopify.com";

/// Storefront token the fake expects.
pub const ACCESS_TOKEN: &str = "shpat_integration_storefront_token";

/// Gemini key the fake expects.
pub const API_KEY: &str = "AIzaIntegrationTestKey";

/// Model name used in fake configs.
pub const MODEL: &str = "gemini-test";

/// Price of every variant in fake carts.
pub const UNIT_PRICE: &str = "10.00";

/// Serve `router` on an ephemeral loopback port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// =============================================================================
// Shopify
// =============================================================================

/// A product node in the Storefront API's `products` shape.
///
/// Product `n` has id `gid://shopify/Product/{n}` and one variant
/// `gid://shopify/ProductVariant/{n}00`.
#[must_use]
pub fn product_node(n: usize, title: &str, price: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{n}"),
        "title": title,
        "description": format!("{title} description"),
        "handle": title.to_lowercase().replace(' ', "-"),
        "priceRange": {
            "minVariantPrice": { "amount": price, "currencyCode": "USD" }
        },
        "images": {
            "edges": [{
                "node": {
                    "url": format!("https://cdn.shopify.com/products/{n}.jpg"),
                    "altText": null
                }
            }]
        },
        "variants": {
            "edges": [{
                "node": {
                    "id": variant_id(n),
                    "availableForSale": true
                }
            }]
        }
    })
}

/// Products `1..=count`, titled `Product {n}`.
#[must_use]
pub fn catalog(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| product_node(n, &format!("Product {n}"), "19.99"))
        .collect()
}

/// Variant id of product `n`.
#[must_use]
pub fn variant_id(n: usize) -> String {
    format!("gid://shopify/ProductVariant/{n}00")
}

/// A line in a fake remote cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    pub id: String,
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Default)]
struct ShopState {
    products: Vec<Value>,
    carts: HashMap<String, Vec<RemoteLine>>,
    operations: Vec<String>,
    tokens: Vec<String>,
    failing: bool,
    rate_limit: Option<u64>,
    next_id: u64,
}

type SharedShop = Arc<Mutex<ShopState>>;

/// In-memory Storefront API.
#[derive(Clone)]
pub struct FakeShopify {
    addr: SocketAddr,
    state: SharedShop,
}

impl FakeShopify {
    /// Start a fake serving `products` in order.
    pub async fn start(products: Vec<Value>) -> Self {
        let state = Arc::new(Mutex::new(ShopState {
            products,
            ..ShopState::default()
        }));
        let router = Router::new()
            .route("/api/{version}/graphql.json", post(graphql))
            .with_state(Arc::clone(&state));

        Self {
            addr: serve(router).await,
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap()
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/2024-01/graphql.json", self.addr)
    }

    /// Client config pointed at this fake.
    #[must_use]
    pub fn config(&self) -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: STORE.to_string(),
            api_version: "2024-01".to_string(),
            storefront_token: SecretString::from(ACCESS_TOKEN),
            endpoint: Some(self.endpoint()),
        }
    }

    /// Answer every request with 503 while `failing` is set.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Answer every request with 429 and this `Retry-After` while set.
    pub fn set_rate_limited(&self, retry_after: Option<u64>) {
        self.lock().rate_limit = retry_after;
    }

    /// Forget every remote cart, as if they all expired.
    pub fn expire_carts(&self) {
        self.lock().carts.clear();
    }

    /// Operation names received, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.lock().operations.clone()
    }

    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.as_str() == operation)
            .count()
    }

    /// Access tokens received, in order.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.lock().tokens.clone()
    }

    /// Lines of a remote cart, or `None` if it does not exist.
    #[must_use]
    pub fn cart(&self, id: &str) -> Option<Vec<RemoteLine>> {
        self.lock().carts.get(id).cloned()
    }

    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.lock().carts.len()
    }
}

impl ShopState {
    fn fresh_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("gid://shopify/{kind}/{}", self.next_id)
    }

    fn products_page(&self, variables: &Value) -> Value {
        let first = variables["first"]
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(50);
        let start = variables["after"]
            .as_str()
            .and_then(|cursor| cursor.parse::<usize>().ok())
            .unwrap_or(0)
            .min(self.products.len());
        let end = start.saturating_add(first).min(self.products.len());

        let edges: Vec<Value> = self
            .products
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|node| json!({ "node": node }))
            .collect();

        json!({
            "products": {
                "edges": edges,
                "pageInfo": {
                    "hasNextPage": end < self.products.len(),
                    "endCursor": (end > start).then(|| end.to_string())
                }
            }
        })
    }

    fn title_for(&self, variant: &str) -> String {
        self.products
            .iter()
            .find(|p| p["variants"]["edges"][0]["node"]["id"] == variant)
            .and_then(|p| p["title"].as_str())
            .unwrap_or("Unknown")
            .to_string()
    }

    fn cart_json(&self, id: &str) -> Value {
        let Some(lines) = self.carts.get(id) else {
            return Value::Null;
        };
        let total: i64 = lines.iter().map(|line| line.quantity * 10).sum();
        let edges: Vec<Value> = lines
            .iter()
            .map(|line| {
                json!({
                    "node": {
                        "id": line.id,
                        "quantity": line.quantity,
                        "cost": {
                            "amountPerQuantity": { "amount": UNIT_PRICE, "currencyCode": "USD" }
                        },
                        "merchandise": {
                            "id": line.variant_id,
                            "title": "Default Title",
                            "product": { "title": self.title_for(&line.variant_id) }
                        }
                    }
                })
            })
            .collect();
        let token = id.rsplit('/').next().unwrap_or(id);

        json!({
            "id": id,
            "checkoutUrl": format!("https://{STORE}/cart/c/{token}"),
            "cost": { "totalAmount": { "amount": format!("{total}.00"), "currencyCode": "USD" } },
            "lines": { "edges": edges }
        })
    }

    fn payload(&self, id: &str) -> Value {
        if self.carts.contains_key(id) {
            json!({ "cart": self.cart_json(id), "userErrors": [] })
        } else {
            json!({
                "cart": null,
                "userErrors": [{ "field": ["cartId"], "message": "The specified cart does not exist." }]
            })
        }
    }

    fn add_lines(&mut self, id: &str, lines: &Value) {
        let inputs: Vec<(String, i64)> = lines
            .as_array()
            .into_iter()
            .flatten()
            .map(|line| {
                (
                    line["merchandiseId"].as_str().unwrap_or_default().to_string(),
                    line["quantity"].as_i64().unwrap_or(1),
                )
            })
            .collect();

        for (variant, quantity) in inputs {
            let line_id = self.fresh_id("CartLine");
            let Some(cart) = self.carts.get_mut(id) else {
                return;
            };
            match cart.iter_mut().find(|line| line.variant_id == variant) {
                Some(line) => line.quantity += quantity,
                None => cart.push(RemoteLine {
                    id: line_id,
                    variant_id: variant,
                    quantity,
                }),
            }
        }
    }

    fn update_lines(&mut self, id: &str, lines: &Value) {
        let Some(cart) = self.carts.get_mut(id) else {
            return;
        };
        for update in lines.as_array().into_iter().flatten() {
            let quantity = update["quantity"].as_i64().unwrap_or(0);
            if let Some(line) = cart.iter_mut().find(|line| update["id"] == line.id.as_str()) {
                line.quantity = quantity;
            }
        }
        cart.retain(|line| line.quantity > 0);
    }

    fn remove_lines(&mut self, id: &str, line_ids: &Value) {
        let Some(cart) = self.carts.get_mut(id) else {
            return;
        };
        let ids: Vec<&str> = line_ids
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        cart.retain(|line| !ids.contains(&line.id.as_str()));
    }
}

async fn graphql(
    State(state): State<SharedShop>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    let variables = &body["variables"];
    let mut shop = state.lock().unwrap();

    shop.operations.push(operation.clone());
    if let Some(token) = headers
        .get("x-shopify-storefront-access-token")
        .and_then(|v| v.to_str().ok())
    {
        shop.tokens.push(token.to_string());
    }

    if let Some(retry_after) = shop.rate_limit {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
        )
            .into_response();
    }
    if shop.failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable").into_response();
    }

    let cart_id = variables["cartId"].as_str().unwrap_or_default().to_string();
    let data = match operation.as_str() {
        "GetProducts" => shop.products_page(variables),
        "CreateCart" => {
            let id = shop.fresh_id("Cart");
            shop.carts.insert(id.clone(), Vec::new());
            shop.add_lines(&id, &variables["input"]["lines"]);
            json!({ "cartCreate": shop.payload(&id) })
        }
        "GetCart" => json!({ "cart": shop.cart_json(&cart_id) }),
        "AddToCart" => {
            shop.add_lines(&cart_id, &variables["lines"]);
            json!({ "cartLinesAdd": shop.payload(&cart_id) })
        }
        "UpdateCartLines" => {
            shop.update_lines(&cart_id, &variables["lines"]);
            json!({ "cartLinesUpdate": shop.payload(&cart_id) })
        }
        "RemoveFromCart" => {
            shop.remove_lines(&cart_id, &variables["lineIds"]);
            json!({ "cartLinesRemove": shop.payload(&cart_id) })
        }
        other => {
            return Json(json!({
                "errors": [{ "message": format!("Unknown operation {other}") }]
            }))
            .into_response();
        }
    };

    Json(json!({ "data": data })).into_response()
}

// =============================================================================
// Gemini
// =============================================================================

/// One scripted answer, consumed per request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A single text reply (one SSE event when streamed).
    Text(String),
    /// One SSE event per chunk; concatenated when not streamed.
    Chunks(Vec<String>),
    /// Chunks followed by an event that is not valid JSON.
    Broken(Vec<String>),
    /// Prompt blocked by safety filters.
    Blocked,
    /// An error status with a Google API error body.
    Error {
        code: u16,
        status: String,
        message: String,
    },
}

impl ScriptedReply {
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    #[must_use]
    pub fn chunks(chunks: &[&str]) -> Self {
        Self::Chunks(chunks.iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn error(code: u16, status: &str, message: &str) -> Self {
        Self::Error {
            code,
            status: status.to_string(),
            message: message.to_string(),
        }
    }
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct GeminiCall {
    /// `{model}:{method}` from the URL.
    pub method: String,
    pub api_key: Option<String>,
    pub body: Value,
}

impl GeminiCall {
    /// Prompt text of the first content part.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.method.ends_with(":streamGenerateContent")
    }
}

#[derive(Default)]
struct GeminiState {
    replies: VecDeque<ScriptedReply>,
    calls: Vec<GeminiCall>,
}

type SharedGemini = Arc<Mutex<GeminiState>>;

/// Scripted Gemini API. Answers `OK` once the script runs out.
#[derive(Clone)]
pub struct FakeGemini {
    addr: SocketAddr,
    state: SharedGemini,
}

impl FakeGemini {
    pub async fn start() -> Self {
        let state = SharedGemini::default();
        let router = Router::new()
            .route("/v1beta/models/{*method}", post(generate))
            .with_state(Arc::clone(&state));

        Self {
            addr: serve(router).await,
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GeminiState> {
        self.state.lock().unwrap()
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointed at this fake.
    #[must_use]
    pub fn config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: SecretString::from(API_KEY),
            model: MODEL.to_string(),
            base_url: self.base_url(),
        }
    }

    /// Queue a reply for the next request.
    pub fn push(&self, reply: ScriptedReply) {
        self.lock().replies.push_back(reply);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<GeminiCall> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<GeminiCall> {
        self.lock().calls.last().cloned()
    }
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn blocked() -> Value {
    json!({ "promptFeedback": { "blockReason": "SAFETY" } })
}

fn event_stream(events: impl IntoIterator<Item = String>) -> Response {
    let body: String = events
        .into_iter()
        .map(|data| format!("data: {data}\r\n\r\n"))
        .collect();
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn generate(
    State(state): State<SharedGemini>,
    UrlPath(method): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let call = GeminiCall {
        method,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        body,
    };
    let stream = call.is_stream();

    let reply = {
        let mut gemini = state.lock().unwrap();
        gemini.calls.push(call);
        gemini
            .replies
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::text("OK"))
    };

    match (reply, stream) {
        (
            ScriptedReply::Error {
                code,
                status,
                message,
            },
            _,
        ) => {
            let body = json!({ "error": { "code": code, "message": message, "status": status } });
            let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (code, Json(body)).into_response()
        }
        (ScriptedReply::Blocked, true) => event_stream([blocked().to_string()]),
        (ScriptedReply::Blocked, false) => Json(blocked()).into_response(),
        (ScriptedReply::Text(text), true) => event_stream([candidate(&text).to_string()]),
        (ScriptedReply::Text(text), false) => Json(candidate(&text)).into_response(),
        (ScriptedReply::Chunks(chunks), true) => {
            event_stream(chunks.iter().map(|chunk| candidate(chunk).to_string()))
        }
        (ScriptedReply::Broken(chunks), true) => event_stream(
            chunks
                .iter()
                .map(|chunk| candidate(chunk).to_string())
                .chain(std::iter::once("{\"candidates\": [".to_string())),
        ),
        (ScriptedReply::Chunks(chunks) | ScriptedReply::Broken(chunks), false) => {
            Json(candidate(&chunks.concat())).into_response()
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Storefront config wired to both fakes, storing CLI data under `data_dir`.
#[must_use]
pub fn test_config(shopify: &FakeShopify, gemini: &FakeGemini, data_dir: &Path) -> StorefrontConfig {
    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        shopify: shopify.config(),
        gemini: gemini.config(),
        catalog: CatalogConfig::default(),
        http_timeout: Duration::from_secs(5),
        data_dir: data_dir.to_path_buf(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A fresh directory under the system temp dir.
#[must_use]
pub fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("shopease-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// =============================================================================
// Storefront
// =============================================================================

/// The storefront router served against fresh fakes.
pub struct TestApp {
    addr: SocketAddr,
    pub shopify: FakeShopify,
    pub gemini: FakeGemini,
}

impl TestApp {
    pub async fn spawn(products: Vec<Value>) -> Self {
        let shopify = FakeShopify::start(products).await;
        let gemini = FakeGemini::start().await;
        let config = test_config(&shopify, &gemini, &temp_dir());
        let state = AppState::new(config).unwrap();

        Self {
            addr: serve(shopease_storefront::app(state)).await,
            shopify,
            gemini,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A visitor: keeps its session cookie and does not follow redirects.
    #[must_use]
    pub fn visitor() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }
}
