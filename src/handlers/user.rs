//! Signup, login and logout

use crate::context::PageContext;
use crate::error::{AppError, Result};
use crate::handlers::forms::{LoginForm, SignupForm};
use crate::middleware::{AuthStatus, CsrfToken};
use crate::server::AppState;
use crate::session::{keys, Session};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde_json::json;

pub async fn signup_form(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
) -> Result<Response> {
    let ctx = PageContext::build(&session, auth, &csrf)
        .with_payload(&json!({ "form": SignupForm::default() }))?;
    Ok(app.renderer.render("signup", StatusCode::OK, &ctx))
}

pub async fn signup(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
    Form(mut form): Form<SignupForm>,
) -> Result<Response> {
    if !form.validate() {
        let ctx = PageContext::build(&session, auth, &csrf)
            .with_payload(&json!({ "form": form }))?;
        return Ok(app
            .renderer
            .render("signup", StatusCode::UNPROCESSABLE_ENTITY, &ctx));
    }

    match app
        .users
        .insert(&form.name, &form.email, &form.password)
        .await
    {
        Ok(_) => {
            session.insert(keys::FLASH, &"Your signup was successful. Please log in.");
            Ok(Redirect::to("/user/login").into_response())
        }
        Err(AppError::DuplicateEmail) => {
            form.validator
                .add_field_error("email", "Email address is already in use");
            let ctx = PageContext::build(&session, auth, &csrf)
                .with_payload(&json!({ "form": form }))?;
            Ok(app
                .renderer
                .render("signup", StatusCode::UNPROCESSABLE_ENTITY, &ctx))
        }
        Err(e) => Err(e),
    }
}

pub async fn login_form(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
) -> Result<Response> {
    let ctx = PageContext::build(&session, auth, &csrf)
        .with_payload(&json!({ "form": LoginForm::default() }))?;
    Ok(app.renderer.render("login", StatusCode::OK, &ctx))
}

pub async fn login(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Extension(csrf): Extension<CsrfToken>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response> {
    if !form.validate() {
        let ctx = PageContext::build(&session, auth, &csrf)
            .with_payload(&json!({ "form": form }))?;
        return Ok(app
            .renderer
            .render("login", StatusCode::UNPROCESSABLE_ENTITY, &ctx));
    }

    match app.users.authenticate(&form.email, &form.password).await {
        Ok(id) => {
            // Privilege change: rotate the session token (and with it the
            // CSRF token) before attaching the principal
            session.renew_token();
            session.insert(keys::PRINCIPAL, &id);
            Ok(Redirect::to("/snippet/create").into_response())
        }
        Err(AppError::InvalidCredentials) => {
            // Deliberately not field-attributed: the response must not
            // disclose whether the email or the password was wrong
            form.validator.add_non_field_error("Email or password is incorrect");
            let ctx = PageContext::build(&session, auth, &csrf)
                .with_payload(&json!({ "form": form }))?;
            Ok(app
                .renderer
                .render("login", StatusCode::UNPROCESSABLE_ENTITY, &ctx))
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(
    Extension(session): Extension<Session>,
) -> Result<Response> {
    // Privilege change in the other direction: rotate tokens, drop the
    // principal, and the very next request resolves anonymous
    session.renew_token();
    session.remove(keys::PRINCIPAL);
    session.insert(keys::FLASH, &"You've been logged out successfully!");
    Ok(Redirect::to("/").into_response())
}
