//! Configuration management for Snipbox

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address, e.g. `0.0.0.0:4000`
    pub http_addr: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration (session store)
    pub redis: RedisConfig,
    /// Session configuration
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Session lifecycle and cookie configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sliding session lifetime in seconds (renewed on every save)
    pub ttl_secs: u64,
    /// Upper bound on a single session store load/save/delete call
    pub store_timeout_secs: u64,
    /// Whether session and CSRF cookies carry the `Secure` attribute.
    /// Disable only for local development over plain HTTP.
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // 12 hours of inactivity
            ttl_secs: 43_200,
            store_timeout_secs: 3,
            cookie_secure: true,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_addr: env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            session: SessionConfig {
                ttl_secs: env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(43_200),
                store_timeout_secs: env::var("SESSION_STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3),
                cookie_secure: env::var("COOKIE_SECURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.ttl(), Duration::from_secs(43_200));
        assert_eq!(cfg.store_timeout(), Duration::from_secs(3));
        assert!(cfg.cookie_secure);
    }
}
