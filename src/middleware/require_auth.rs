//! Auth gate for protected routes
//!
//! Innermost layer of the protected chain, after the resolver. Anonymous
//! requests are redirected to the login page (a redirect, not an error);
//! authenticated responses are marked non-cacheable so protected content
//! never comes back from a shared or browser cache.

use crate::middleware::authenticate::AuthStatus;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Login entry point anonymous requests are sent to
pub const LOGIN_PATH: &str = "/user/login";

/// Auth gate middleware
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let authenticated = request
        .extensions()
        .get::<AuthStatus>()
        .map(|status| status.is_authenticated)
        .unwrap_or(false);

    if !authenticated {
        // 303 forces a GET on the redirected request
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
