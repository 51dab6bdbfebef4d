//! Session attachment middleware
//!
//! Two-phase lifecycle around every dynamic-chain request: load the
//! session before the handler runs, save it after the handler returns.
//! The save happens even for error responses, so flash messages and
//! token renewals set while handling a failure still persist. Store
//! calls are bounded by a short timeout; a slow store surfaces as an
//! internal fault rather than stalling the request.

use super::store::SessionStore;
use super::Session;
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Shared state for the session attachment middleware
#[derive(Clone)]
pub struct SessionLayerState {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    store_timeout: Duration,
    cookie_secure: bool,
}

impl SessionLayerState {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            ttl: config.ttl(),
            store_timeout: config.store_timeout(),
            cookie_secure: config.cookie_secure,
        }
    }
}

/// Session attachment middleware.
///
/// Exactly one store load and one store save per request, no matter how
/// many interceptors or the handler itself touch session state.
pub async fn session_middleware(
    State(state): State<SessionLayerState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = request_cookie(&request, SESSION_COOKIE);

    let session = match token {
        Some(token) => {
            let loaded = timeout(state.store_timeout, state.store.load(&token))
                .await
                .map_err(|_| AppError::SessionStoreTimeout)??;
            match loaded {
                Some(record) => Session::from_parts(token, record.data),
                // Unknown or expired token: start a fresh session
                None => Session::new(),
            }
        }
        None => Session::new(),
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    // Save phase: runs for error responses too
    let (token, record, stale) = session.save_state();
    if let Some(stale) = stale {
        timeout(state.store_timeout, state.store.delete(&stale))
            .await
            .map_err(|_| AppError::SessionStoreTimeout)??;
    }
    timeout(state.store_timeout, state.store.save(&token, &record, state.ttl))
        .await
        .map_err(|_| AppError::SessionStoreTimeout)??;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(state.ttl.as_secs() as i64))
        .build();
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }

    Ok(response)
}

/// Read a cookie value from the request's `Cookie` headers
pub(crate) fn request_cookie(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}
