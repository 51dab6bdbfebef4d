//! Common test utilities
//!
//! In-process test application: the full router with in-memory doubles
//! behind every collaborator trait, driven through `tower::ServiceExt`
//! with a cookie jar so multi-request scenarios behave like a browser.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    Router,
};
use cookie::Cookie;
use snipbox::config::{Config, DatabaseConfig, RedisConfig, SessionConfig};
use snipbox::render::MinimalRenderer;
use snipbox::repository::{MemorySnippetRepository, MemoryUserRepository};
use snipbox::server::{build_router, AppState};
use snipbox::session::MemorySessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserRepository>,
    pub snippets: Arc<MemorySnippetRepository>,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let snippets = Arc::new(MemorySnippetRepository::new());
        let sessions = Arc::new(MemorySessionStore::new());

        let config = Config {
            http_addr: "127.0.0.1:0".to_string(),
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
                max_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://unused".to_string(),
            },
            session: SessionConfig {
                ttl_secs: 3600,
                store_timeout_secs: 1,
                cookie_secure: false,
            },
        };

        let state = AppState {
            config: Arc::new(config),
            users: users.clone(),
            snippets: snippets.clone(),
            sessions: sessions.clone(),
            renderer: Arc::new(MinimalRenderer),
        };

        Self {
            router: build_router(state),
            users,
            snippets,
            sessions,
        }
    }

    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            jar: HashMap::new(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Router driver with a cookie jar
pub struct TestClient {
    router: Router,
    jar: HashMap<String, String>,
}

impl TestClient {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let mut builder = Request::builder().uri(path);
        if let Some(cookies) = self.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key, value);
        }
        let body = serializer.finish();

        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookies) = self.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    fn cookie_header(&self) -> Option<String> {
        if self.jar.is_empty() {
            return None;
        }
        Some(
            self.jar
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Current CSRF token, as mirrored to the client in its cookie
    pub fn csrf_token(&self) -> Option<String> {
        self.jar.get("csrf_token").cloned()
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.jar.get("session").cloned()
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request must not error at the transport level");

        let status = response.status();
        let headers = response.headers().clone();
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                if let Ok(cookie) = Cookie::parse(raw.to_string()) {
                    self.jar
                        .insert(cookie.name().to_string(), cookie.value().to_string());
                }
            }
        }

        let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("body read");
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
