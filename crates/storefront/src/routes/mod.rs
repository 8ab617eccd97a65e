//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products?page=N        - Product listing (client-side pages over the full catalog)
//! GET  /products/{id}          - Product detail by full or short id
//!
//! # Cart (JSON, stored in the visitor session)
//! GET  /cart                   - Cart contents and totals
//! POST /cart/add               - Add a product
//! POST /cart/update            - Overwrite a line's quantity
//! POST /cart/remove            - Drop a line
//! POST /cart/clear             - Empty the cart
//!
//! # Checkout
//! GET  /checkout               - Redirect to the hosted checkout
//!
//! # Assistant
//! GET  /chat                   - Transcript
//! POST /chat                   - Send a message, wait for the reply
//! POST /chat/stream            - Send a message, stream the reply (SSE)
//! POST /chat/recommend         - Product recommendations for a query
//! POST /chat/sentiment         - Classify a message's tone
//! ```

pub mod cart;
pub mod chat;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the assistant routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::transcript).post(chat::send))
        .route("/stream", post(chat::stream))
        .route("/recommend", post(chat::recommend))
        .route("/sentiment", post(chat::sentiment))
}

/// Create the main application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        .nest("/chat", chat_routes())
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
