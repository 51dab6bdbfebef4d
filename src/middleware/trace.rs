//! Request span for `TraceLayer`
//!
//! One span per request carrying method, URI and protocol version, so
//! every log line emitted while handling the request is attributable.

use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// `MakeSpan` implementation for the base chain's request logging
#[derive(Clone, Debug)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}
