//! Panic recovery
//!
//! Outermost layer of the base chain: converts a panic anywhere below it
//! into a generic 500 response instead of tearing down the connection
//! task. Used with `tower_http::catch_panic::CatchPanicLayer::custom`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::backtrace::Backtrace;

/// Build the response for a recovered panic.
///
/// Logs the payload with a backtrace at error severity and marks the
/// connection non-reusable; the client only ever sees a generic body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(
        panic = %detail,
        backtrace = %Backtrace::force_capture(),
        "request handler panicked"
    );

    let mut response =
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn panicking_handler() -> &'static str {
        panic!("boom");
    }

    #[tokio::test]
    async fn test_panic_becomes_500_with_connection_close() {
        let app = Router::new()
            .route("/panic", get(panicking_handler))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "close"
        );

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        // No internal detail leaks to the client
        assert_eq!(&body[..], b"Internal Server Error");
    }
}
