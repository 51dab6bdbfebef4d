//! Page handlers
//!
//! Handlers sit below the full dynamic chain: they can rely on the
//! session handle, the CSRF token and the resolved authentication status
//! being present in request extensions.

pub mod forms;
pub mod health;
pub mod snippet;
pub mod user;
