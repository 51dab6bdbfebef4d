//! Rendering seam
//!
//! The template stack is an external collaborator; the pipeline's
//! responsibility ends at handing it a populated [`PageContext`]. The
//! trait keeps handlers renderer-agnostic, and the bundled implementation
//! is deliberately bare: enough structure for the browser and for tests
//! to observe flash messages, auth state and form errors.

use crate::context::PageContext;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Renders a page from a request-scoped context
pub trait Renderer: Send + Sync {
    fn render(&self, page: &str, status: StatusCode, ctx: &PageContext) -> Response;
}

/// Minimal HTML renderer
pub struct MinimalRenderer;

impl Renderer for MinimalRenderer {
    fn render(&self, page: &str, status: StatusCode, ctx: &PageContext) -> Response {
        let mut body = String::with_capacity(512);
        body.push_str("<!doctype html>\n<html>\n<head>\n");
        body.push_str(&format!("<title>{} - Snipbox</title>\n", escape(page)));
        body.push_str(&format!(
            "<meta name=\"csrf-token\" content=\"{}\">\n",
            escape(&ctx.csrf_token)
        ));
        body.push_str("</head>\n<body>\n");

        if ctx.is_authenticated {
            body.push_str("<nav>signed in</nav>\n");
        } else {
            body.push_str("<nav>anonymous</nav>\n");
        }

        if let Some(flash) = &ctx.flash {
            body.push_str(&format!("<p class=\"flash\">{}</p>\n", escape(flash)));
        }

        let payload = serde_json::to_string_pretty(&ctx.payload).unwrap_or_default();
        body.push_str(&format!("<pre id=\"payload\">{}</pre>\n", escape(&payload)));

        body.push_str(&format!(
            "<footer>&copy; {}</footer>\n</body>\n</html>\n",
            ctx.current_year
        ));

        (status, Html(body)).into_response()
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
