//! Health check endpoint

/// Liveness probe; sits outside the dynamic chain on purpose.
pub async fn ping() -> &'static str {
    "OK"
}
