//! Per-session request serialization.
//!
//! tower-sessions loads a visitor's record lazily and writes the whole record
//! back after the handler returns. Two requests carrying the same session
//! cookie would each save their own copy and the last one wins, so requests
//! for one session run one at a time. Requests without a session cookie are
//! not serialized; each of them starts a fresh session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Map size above which released entries are pruned.
const PRUNE_THRESHOLD: usize = 128;

/// One async lock per session id.
///
/// Entries are weak so a lock lives only while some request holds or waits
/// on it.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(session_id).and_then(Weak::upgrade) {
            return lock;
        }

        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| lock.strong_count() > 0);
        }
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(session_id.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Wait for exclusive access to a session.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        self.lock_for(session_id).lock_owned().await
    }
}

/// Session id carried by the request's session cookie, if any.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// Middleware holding the session lock for the whole request.
///
/// Must sit outside the session layer so the lock also covers the session
/// save that runs after the handler.
pub async fn session_lock_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = match session_cookie(request.headers()) {
        Some(session_id) => Some(state.session_locks().acquire(&session_id).await),
        None => None,
    };

    next.run(request).await
}
