//! Durable key/value storage for cart state.
//!
//! Values are opaque strings (JSON documents in practice). Each front-end
//! picks a backend:
//!
//! - [`FileStorage`] - a JSON file on disk, used by the CLI
//! - [`SessionStorage`] - the visitor's tower-sessions session, used by the server
//! - [`MemoryStorage`] - process memory, used by tests

mod file;
mod memory;
mod session;

use std::future::Future;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use session::SessionStorage;

use thiserror::Error;

/// Storage slot names.
pub mod keys {
    /// Serialized cart lines.
    pub const CART: &str = "shopease_cart";

    /// Serialized checkout session, or JSON `null` when there is none.
    pub const CHECKOUT: &str = "shopease_checkout";

    /// Serialized chat transcript (server sessions only).
    pub const CHAT: &str = "shopease_chat";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Session store error: {0}")]
    Session(String),
}

/// A string key/value store that survives reloads.
pub trait LocalStore: Send + Sync {
    /// Read a slot. `None` when the slot was never written.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite a slot.
    fn write(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}
