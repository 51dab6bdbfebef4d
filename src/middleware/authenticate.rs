//! Authentication resolver
//!
//! Runs on every dynamic-chain request, after session attachment. Reads
//! the principal identifier from the session and derives the
//! request-scoped authentication flag. An absent or no-longer-existing
//! principal resolves to anonymous; a user store failure is a hard
//! internal fault.

use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use crate::session::{keys, Session};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Request-scoped authentication status, derived server-side once per
/// request. Never read from client input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthStatus {
    pub is_authenticated: bool,
}

/// Shared state for the resolver middleware
#[derive(Clone)]
pub struct AuthResolverState {
    pub users: Arc<dyn UserRepository>,
}

/// Authentication resolver middleware
pub async fn authenticate_middleware(
    State(state): State<AuthResolverState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "auth resolver requires the session attachment layer"
            ))
        })?;

    let mut status = AuthStatus::default();
    if let Some(id) = session.get::<i64>(keys::PRINCIPAL) {
        // A deleted or disabled account loses access on its next request
        if state.users.exists(id).await? {
            status.is_authenticated = true;
        }
    }

    request.extensions_mut().insert(status);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn resolver_app(users: MockUserRepository, session: Session) -> Router {
        async fn status_handler(Extension(status): Extension<AuthStatus>) -> String {
            format!("{}", status.is_authenticated)
        }

        let state = AuthResolverState {
            users: Arc::new(users),
        };

        // Inject a prepared session below the resolver, standing in for
        // the attachment middleware.
        Router::new()
            .route("/status", get(status_handler))
            .layer(axum::middleware::from_fn_with_state(
                state,
                authenticate_middleware,
            ))
            .layer(Extension(session))
    }

    async fn resolve(users: MockUserRepository, session: Session) -> (StatusCode, String) {
        let response = resolver_app(users, session)
            .oneshot(HttpRequest::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_no_principal_resolves_anonymous() {
        let mut users = MockUserRepository::new();
        users.expect_exists().never();

        let (status, body) = resolve(users, Session::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "false");
    }

    #[tokio::test]
    async fn test_existing_principal_resolves_authenticated() {
        let mut users = MockUserRepository::new();
        users.expect_exists().returning(|_| Ok(true));

        let session = Session::new();
        session.insert(keys::PRINCIPAL, &7i64);

        let (status, body) = resolve(users, session).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "true");
    }

    #[tokio::test]
    async fn test_vanished_principal_fails_open_to_anonymous() {
        let mut users = MockUserRepository::new();
        users.expect_exists().returning(|_| Ok(false));

        let session = Session::new();
        session.insert(keys::PRINCIPAL, &7i64);

        let (status, body) = resolve(users, session).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "false");
    }

    #[tokio::test]
    async fn test_store_error_is_a_hard_fault() {
        let mut users = MockUserRepository::new();
        users
            .expect_exists()
            .returning(|_| Err(AppError::Internal(anyhow::anyhow!("store down"))));

        let session = Session::new();
        session.insert(keys::PRINCIPAL, &7i64);

        let (status, _) = resolve(users, session).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
