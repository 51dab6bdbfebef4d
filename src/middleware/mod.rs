//! HTTP middleware for the Snipbox request pipeline
//!
//! Base chain (every route): panic recovery, request tracing, security
//! headers. Dynamic chain (session-bearing routes): session attachment
//! (see [`crate::session::middleware`]), CSRF guard, auth resolver.
//! Protected routes add the auth gate as the innermost layer.

pub mod authenticate;
pub mod csrf;
pub mod recover;
pub mod require_auth;
pub mod security_headers;
pub mod trace;

pub use authenticate::{authenticate_middleware, AuthResolverState, AuthStatus};
pub use csrf::{csrf_middleware, CsrfConfig, CsrfToken, CSRF_COOKIE, CSRF_FORM_FIELD, CSRF_HEADER};
pub use recover::handle_panic;
pub use require_auth::require_auth_middleware;
pub use security_headers::security_headers_middleware;
pub use trace::RequestSpan;
