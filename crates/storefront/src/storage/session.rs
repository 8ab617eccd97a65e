//! Storage over the visitor's HTTP session.

use tower_sessions::Session;

use super::{LocalStore, StorageError};

/// Per-visitor storage backed by a `tower-sessions` session.
///
/// The session plays the role browser local storage plays for a
/// single-page storefront: one set of slots per visitor cookie.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStore for SessionStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.session
            .get::<String>(key)
            .await
            .map_err(|e| StorageError::Session(e.to_string()))
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| StorageError::Session(e.to_string()))
    }
}
