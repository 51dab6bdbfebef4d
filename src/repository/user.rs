//! User repository

use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account, returning its id.
    /// Fails with [`AppError::DuplicateEmail`] if the email is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64>;

    /// Verify credentials, returning the principal id.
    /// Fails with [`AppError::InvalidCredentials`] on a wrong email or
    /// password; the caller must not learn which.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64>;

    /// Whether an account with this id still exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored password hash invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64> {
        let hashed = hash_password(password)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some("23505")
                    && db.constraint() == Some("users_uc_email") =>
            {
                AppError::DuplicateEmail
            }
            _ => AppError::Database(e),
        })?;

        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let (id, hashed) = row.ok_or(AppError::InvalidCredentials)?;
        if verify_password(password, &hashed)? {
            Ok(id)
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT true FROM users WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

struct MemoryUser {
    id: i64,
    email: String,
    // Test double keeps the secret in clear; hashing is the production
    // implementation's concern.
    password: String,
}

/// In-memory double for tests and local experiments
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<MemoryUser>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts, for test assertions
    pub fn count(&self) -> usize {
        self.users.lock().expect("repo lock poisoned").len()
    }

    /// Drop an account, simulating deletion behind a live session
    pub fn remove(&self, id: i64) {
        let mut users = self.users.lock().expect("repo lock poisoned");
        users.retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, _name: &str, email: &str, password: &str) -> Result<i64> {
        let mut users = self.users.lock().expect("repo lock poisoned");
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateEmail);
        }
        let id = users.len() as i64 + 1;
        users.push(MemoryUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64> {
        let users = self.users.lock().expect("repo lock poisoned");
        users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(|u| u.id)
            .ok_or(AppError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let users = self.users.lock().expect("repo lock poisoned");
        Ok(users.iter().any(|u| u.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pa$$word").unwrap();
        assert!(verify_password("pa$$word", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_memory_repo_duplicate_email() {
        let repo = MemoryUserRepository::new();
        repo.insert("Alice", "alice@example.com", "pw123456").await.unwrap();
        let err = repo
            .insert("Alice2", "alice@example.com", "pw123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_memory_repo_authenticate() {
        let repo = MemoryUserRepository::new();
        let id = repo.insert("Alice", "alice@example.com", "pw123456").await.unwrap();

        assert_eq!(
            repo.authenticate("alice@example.com", "pw123456").await.unwrap(),
            id
        );
        assert!(matches!(
            repo.authenticate("alice@example.com", "nope").await.unwrap_err(),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            repo.authenticate("bob@example.com", "pw123456").await.unwrap_err(),
            AppError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_memory_repo_exists_after_remove() {
        let repo = MemoryUserRepository::new();
        let id = repo.insert("Alice", "alice@example.com", "pw123456").await.unwrap();
        assert!(repo.exists(id).await.unwrap());
        repo.remove(id);
        assert!(!repo.exists(id).await.unwrap());
    }
}
