//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::gemini::{GeminiClient, GeminiError};
use crate::middleware::SessionLocks;
use crate::shopify::{ShopifyError, StorefrontClient};

/// Error building the shared API clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("Gemini client: {0}")]
    Gemini(#[from] GeminiError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds configuration, the API clients and the
/// per-session locks; per-visitor cart and chat state lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    gemini: GeminiClient,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if either API client cannot be built from `config`.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let storefront = StorefrontClient::new(&config.shopify, config.http_timeout)?;
        let gemini = GeminiClient::new(&config.gemini, config.http_timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                gemini,
                session_locks: SessionLocks::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Gemini API client.
    #[must_use]
    pub fn gemini(&self) -> &GeminiClient {
        &self.inner.gemini
    }

    /// Locks serializing requests that share a session.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
