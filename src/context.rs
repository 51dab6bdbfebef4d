//! Request-scoped rendering context
//!
//! Strongly-typed bundle handed to the rendering layer. The pipeline
//! populates the first four fields identically on every request; the
//! handler fills the payload. Building the context pops the flash
//! message, so it is consumed by exactly one rendered page.

use crate::error::Result;
use crate::middleware::{AuthStatus, CsrfToken};
use crate::session::{keys, Session};
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;

/// Data exposed to every rendered page
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    /// Handler-specific data (snippets, forms with their errors, ...)
    pub payload: Value,
}

impl PageContext {
    pub fn build(session: &Session, auth: AuthStatus, csrf: &CsrfToken) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash: session.pop(keys::FLASH),
            is_authenticated: auth.is_authenticated,
            csrf_token: csrf.0.clone(),
            payload: Value::Null,
        }
    }

    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = serde_json::to_value(payload)
            .map_err(|e| anyhow::anyhow!("payload serialize error: {e}"))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_context_consumes_flash() {
        let session = Session::new();
        session.insert(keys::FLASH, &"Your signup was successful. Please log in.");
        let csrf = CsrfToken("tok".to_string());

        let ctx = PageContext::build(&session, AuthStatus::default(), &csrf);
        assert_eq!(
            ctx.flash.as_deref(),
            Some("Your signup was successful. Please log in.")
        );

        let ctx = PageContext::build(&session, AuthStatus::default(), &csrf);
        assert_eq!(ctx.flash, None);
    }

    #[test]
    fn test_context_carries_auth_and_token() {
        let session = Session::new();
        let ctx = PageContext::build(
            &session,
            AuthStatus {
                is_authenticated: true,
            },
            &CsrfToken("tok".to_string()),
        );
        assert!(ctx.is_authenticated);
        assert_eq!(ctx.csrf_token, "tok");
        assert!(ctx.current_year >= 2024);
    }
}
