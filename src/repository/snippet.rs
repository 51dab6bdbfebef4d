//! Snippet repository

use crate::domain::Snippet;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Mutex;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Create a snippet expiring `expires_days` from now, returning its id
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64>;

    /// Fetch a live snippet by id; [`AppError::NotFound`] if unknown or expired
    async fn get(&self, id: i64) -> Result<Snippet>;

    /// The ten most recently created live snippets
    async fn latest(&self) -> Result<Vec<Snippet>>;
}

pub struct PgSnippetRepository {
    pool: PgPool,
}

impl PgSnippetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for PgSnippetRepository {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet> {
        let snippet = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE id = $1 AND expires > CURRENT_TIMESTAMP
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        snippet.ok_or(AppError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>> {
        let snippets = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > CURRENT_TIMESTAMP
            ORDER BY id DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(snippets)
    }
}

/// In-memory double for tests and local experiments
#[derive(Default)]
pub struct MemorySnippetRepository {
    snippets: Mutex<Vec<Snippet>>,
}

impl MemorySnippetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.snippets.lock().expect("repo lock poisoned").len()
    }
}

#[async_trait]
impl SnippetRepository for MemorySnippetRepository {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64> {
        let mut snippets = self.snippets.lock().expect("repo lock poisoned");
        let id = snippets.len() as i64 + 1;
        let now = Utc::now();
        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created: now,
            expires: now + Duration::days(i64::from(expires_days)),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet> {
        let snippets = self.snippets.lock().expect("repo lock poisoned");
        snippets
            .iter()
            .find(|s| s.id == id && s.expires > Utc::now())
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>> {
        let snippets = self.snippets.lock().expect("repo lock poisoned");
        let now = Utc::now();
        Ok(snippets
            .iter()
            .filter(|s| s.expires > now)
            .rev()
            .take(10)
            .cloned()
            .collect())
    }
}
