//! Server initialization and routing
//!
//! Three middleware chains, composed here and nowhere else:
//! - base chain, every route: panic recovery, request tracing, security
//!   headers;
//! - dynamic chain, session-bearing routes: session attachment, CSRF
//!   guard, auth resolver;
//! - protected chain: dynamic chain plus the auth gate, innermost.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    authenticate_middleware, csrf_middleware, handle_panic, require_auth_middleware,
    security_headers_middleware, AuthResolverState, CsrfConfig, RequestSpan,
};
use crate::render::{MinimalRenderer, Renderer};
use crate::repository::{
    PgSnippetRepository, PgUserRepository, SnippetRepository, UserRepository,
};
use crate::session::{session_middleware, RedisSessionStore, SessionLayerState, SessionStore};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

/// Application state shared across handlers.
///
/// Constructed once at startup and passed into the router; every
/// collaborator sits behind a trait so tests swap in doubles at
/// construction time.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub snippets: Arc<dyn SnippetRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub renderer: Arc<dyn Renderer>,
}

/// Build the full application router around `state`
pub fn build_router(state: AppState) -> Router {
    let session_state = SessionLayerState::new(state.sessions.clone(), &state.config.session);
    let resolver_state = AuthResolverState {
        users: state.users.clone(),
    };
    let csrf_config = CsrfConfig {
        cookie_secure: state.config.session.cookie_secure,
    };

    // Protected chain: auth gate runs immediately before the handler
    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet::create_form).post(handlers::snippet::create),
        )
        .route("/user/logout", post(handlers::user::logout))
        .route_layer(axum::middleware::from_fn(require_auth_middleware));

    // Dynamic chain: session attachment, CSRF guard, auth resolver
    // (outermost first)
    let dynamic = Router::new()
        .route("/", get(handlers::snippet::home))
        .route("/snippet/view/{id}", get(handlers::snippet::view))
        .route(
            "/user/signup",
            get(handlers::user::signup_form).post(handlers::user::signup),
        )
        .route(
            "/user/login",
            get(handlers::user::login_form).post(handlers::user::login),
        )
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    session_state,
                    session_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    csrf_config,
                    csrf_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    resolver_state,
                    authenticate_middleware,
                )),
        );

    // Base chain wraps everything, the health check included
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .merge(dynamic)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                .layer(axum::middleware::from_fn(security_headers_middleware)),
        )
        .with_state(state)
}

/// Wire production collaborators and serve until shutdown
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&config.database.url)
        .await?;

    let sessions = RedisSessionStore::connect(&config.redis).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        users: Arc::new(PgUserRepository::new(pool.clone())),
        snippets: Arc::new(PgSnippetRepository::new(pool)),
        sessions: Arc::new(sessions),
        renderer: Arc::new(MinimalRenderer),
    };

    let app = build_router(state);

    let listener = TcpListener::bind(&config.http_addr).await?;
    info!("listening on {}", config.http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
