//! Snippet pages

use crate::context::PageContext;
use crate::error::{AppError, Result};
use crate::handlers::forms::SnippetCreateForm;
use crate::middleware::{AuthStatus, CsrfToken};
use crate::server::AppState;
use crate::session::{keys, Session};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde_json::json;

/// Home page: the latest snippets
pub async fn home(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
) -> Result<Response> {
    let snippets = app.snippets.latest().await?;
    let ctx = PageContext::build(&session, auth, &csrf)
        .with_payload(&json!({ "snippets": snippets }))?;
    Ok(app.renderer.render("home", StatusCode::OK, &ctx))
}

/// View a single snippet
pub async fn view(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
    Path(id): Path<String>,
) -> Result<Response> {
    // Non-numeric or non-positive ids are a 404, not a client error page
    let id: i64 = id.parse().ok().filter(|id| *id >= 1).ok_or(AppError::NotFound)?;

    let snippet = app.snippets.get(id).await?;
    let ctx = PageContext::build(&session, auth, &csrf)
        .with_payload(&json!({ "snippet": snippet }))?;
    Ok(app.renderer.render("view", StatusCode::OK, &ctx))
}

/// Blank snippet creation form
pub async fn create_form(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
) -> Result<Response> {
    let ctx = PageContext::build(&session, auth, &csrf)
        .with_payload(&json!({ "form": SnippetCreateForm::default() }))?;
    Ok(app.renderer.render("create", StatusCode::OK, &ctx))
}

/// Handle the snippet creation submission
pub async fn create(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
    Form(mut form): Form<SnippetCreateForm>,
) -> Result<Response> {
    if !form.validate() {
        let ctx = PageContext::build(&session, auth, &csrf)
            .with_payload(&json!({ "form": form }))?;
        return Ok(app
            .renderer
            .render("create", StatusCode::UNPROCESSABLE_ENTITY, &ctx));
    }

    let id = app
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;

    session.insert(keys::FLASH, &"Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
