//! ShopEase storefront library.
//!
//! Shopify catalog browsing, a local cart mirrored to a Shopify cart, and a
//! Gemini-backed shopping assistant. The `shopease-storefront` binary serves
//! these over HTTP; the `shopease` CLI drives the same services from a
//! terminal.
//!
//! # Modules
//!
//! - [`shopify`] - Storefront API client and the [`shopify::CatalogGateway`] seam
//! - [`gemini`] - Gemini API client and the [`gemini::AssistantGateway`] seam
//! - [`storage`] - Durable key/value slots for cart state
//! - [`services`] - Cart synchronizer, catalog browser, product resolver, chat
//! - [`routes`] - JSON and SSE handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod storage;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can build the app without
/// a Sentry client.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_lock_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
