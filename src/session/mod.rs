//! Server-side sessions
//!
//! A session is a key/value blob owned by the [`store::SessionStore`],
//! keyed by an opaque token carried in a cookie. The attachment middleware
//! loads it once before the handler and saves it once after, so handlers
//! and inner middleware only ever touch the per-request [`Session`] handle.

pub mod middleware;
pub mod store;

pub use middleware::{session_middleware, SessionLayerState, SESSION_COOKIE};
pub use store::{MemorySessionStore, RedisSessionStore, SessionRecord, SessionStore};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Reserved session keys
pub mod keys {
    /// Identifier of the signed-in principal; absence means anonymous
    pub const PRINCIPAL: &str = "authenticated_user_id";
    /// Per-session anti-forgery token
    pub const CSRF_TOKEN: &str = "csrf_token";
    /// One-shot message consumed by the next rendered page
    pub const FLASH: &str = "flash";
}

/// Generate an opaque, unguessable token: 32 bytes from the OS CSPRNG,
/// base64url-encoded (256 bits of entropy).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

struct SessionInner {
    token: String,
    data: HashMap<String, Value>,
    /// Previous token to delete at save time, set by `renew_token`
    stale_token: Option<String>,
}

/// Per-request session handle, shared through request extensions.
///
/// Cloning is cheap and all clones observe the same state; the lock is
/// never held across an await point.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    /// Fresh anonymous session with a newly generated token
    pub fn new() -> Self {
        Self::from_parts(generate_token(), HashMap::new())
    }

    pub(crate) fn from_parts(token: String, data: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                token,
                data,
                stale_token: None,
            })),
        }
    }

    /// Current session token
    pub fn token(&self) -> String {
        self.inner.lock().expect("session lock poisoned").token.clone()
    }

    /// Read a value, deserialized from its stored JSON representation
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let inner = self.inner.lock().expect("session lock poisoned");
        inner
            .data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store a value under `key`
    pub fn insert<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(v) = serde_json::to_value(value) {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            inner.data.insert(key.to_string(), v);
        }
    }

    /// Remove a value
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        inner.data.remove(key)
    }

    /// Read and remove in one step. Used for one-shot values such as the
    /// flash message: reading it clears it.
    pub fn pop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        inner
            .data
            .remove(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Rotate the session token. Called on authentication transitions
    /// (login, logout) to defeat session fixation. The CSRF token is
    /// dropped at the same time so the guard issues a fresh one; the old
    /// store entry is deleted during the save phase.
    pub fn renew_token(&self) {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        let old = std::mem::replace(&mut inner.token, generate_token());
        // Keep the original token if renewed more than once per request
        inner.stale_token.get_or_insert(old);
        inner.data.remove(keys::CSRF_TOKEN);
    }

    /// Snapshot for the save phase: current token, record to persist,
    /// and the stale token to delete (if the token was rotated).
    pub(crate) fn save_state(&self) -> (String, SessionRecord, Option<String>) {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        let stale = inner.stale_token.take();
        (
            inner.token.clone(),
            SessionRecord {
                data: inner.data.clone(),
            },
            stale,
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
