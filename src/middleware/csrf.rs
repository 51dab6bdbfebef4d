//! CSRF guard
//!
//! Double-submit cookie protection for state-changing requests. Each
//! session owns one anti-forgery token, stored in the session record and
//! mirrored to the client in a cookie; mutating requests must echo it
//! back in the `csrf_token` form field or the `X-CSRF-Token` header.
//! Forged cross-origin requests can send the cookie but cannot read it
//! to echo it back.
//!
//! Must run inside the session attachment layer: the token lives in the
//! session, and a token rotated by the handler (login/logout) has to be
//! persisted by the session save phase and re-mirrored here.

use crate::error::{AppError, Result};
use crate::session::{generate_token, keys, Session};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use sha2::{Digest, Sha256};

/// Form field expected to carry the token on mutating requests
pub const CSRF_FORM_FIELD: &str = "csrf_token";
/// Header alternative to the form field, for fetch-based clients
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Cookie mirroring the session's token to the client
pub const CSRF_COOKIE: &str = "csrf_token";

/// Largest mutating body the guard will buffer while looking for the
/// form field; anything bigger is rejected outright.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Request-scoped CSRF token, exposed so handlers can embed it in
/// rendered forms.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

/// Configuration for the CSRF guard
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    pub cookie_secure: bool,
}

/// CSRF guard middleware.
///
/// Safe methods pass through after the per-session token is ensured;
/// any other method must echo the token or is rejected with 403 before
/// the handler runs. Rejections are expected background noise (stale
/// tabs, bots) and are not logged as application errors.
pub async fn csrf_middleware(
    State(config): State<CsrfConfig>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "csrf guard requires the session attachment layer"
            ))
        })?;

    // Ensure the session owns a token before the handler can render forms
    let token = match session.get::<String>(keys::CSRF_TOKEN) {
        Some(token) => token,
        None => {
            let token = generate_token();
            session.insert(keys::CSRF_TOKEN, &token);
            token
        }
    };

    let mut request = request;
    if !is_safe_method(request.method()) {
        let (submitted, restored) = extract_submitted_token(request).await?;
        match submitted {
            Some(ref echoed) if tokens_match(echoed, &token) => {}
            _ => {
                tracing::debug!(
                    method = %restored.method(),
                    uri = %restored.uri(),
                    "rejecting request with missing or mismatched CSRF token"
                );
                return Ok(rejection());
            }
        }
        request = restored;
    }

    request.extensions_mut().insert(CsrfToken(token));
    let mut response = next.run(request).await;

    // The handler may have rotated the session token (login/logout),
    // dropping the CSRF token with it; reissue and mirror the current one.
    let current = match session.get::<String>(keys::CSRF_TOKEN) {
        Some(token) => token,
        None => {
            let token = generate_token();
            session.insert(keys::CSRF_TOKEN, &token);
            token
        }
    };
    let cookie = Cookie::build((CSRF_COOKIE, current))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }

    Ok(response)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Digest comparison keeps the work independent of where the strings
/// first differ.
fn tokens_match(submitted: &str, expected: &str) -> bool {
    Sha256::digest(submitted.as_bytes()) == Sha256::digest(expected.as_bytes())
}

fn rejection() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

/// Pull the echoed token out of the header or the form body, returning
/// the request with its body intact for the handler.
async fn extract_submitted_token(request: Request) -> Result<(Option<String>, Request)> {
    if let Some(token) = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        let token = token.to_string();
        return Ok((Some(token), request));
    }

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        // Oversized or unreadable body: treat as a missing token
        Err(_) => {
            return Ok((None, Request::from_parts(parts, Body::empty())));
        }
    };

    let token = if is_form {
        url::form_urlencoded::parse(&bytes)
            .find(|(key, _)| key == CSRF_FORM_FIELD)
            .map(|(_, value)| value.into_owned())
    } else {
        None
    };

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}
