//! Snipbox - snippet sharing service
//!
//! This crate provides the web-facing core of the snipbox service: the
//! request pipeline (panic recovery, request logging, security headers,
//! session attachment, CSRF protection, authentication resolution) plus
//! the form validation contract the mutating handlers rely on.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod repository;
pub mod server;
pub mod session;
pub mod validator;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
