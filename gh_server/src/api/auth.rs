//! Login, signup and logout handlers.
//!
//! Forms post `username` and `password` as `application/x-www-form-urlencoded`.
//! Every POST answers with `303 See Other`: to `/` on success, back to the
//! form on a credential failure, with the reason waiting in the flash channel.
//!
//! ```bash
//! curl -i -c jar -b jar -d 'username=alice&password=secret1' http://localhost:3000/signup
//! curl -i -c jar -b jar http://localhost:3000/
//! ```

use axum::{
    Form, Json,
    extract::State,
    response::{Redirect, Response},
};
use gatehouse::{AuthError, Credentials, FlashMessage, Identity, Session};
use serde::Serialize;

use super::{
    AppState,
    error::ApiError,
    request_id::RequestId,
    session::{CurrentSession, with_cleared_cookie, with_session_cookie},
};
use crate::{logging, metrics};

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub user: Option<Identity>,
}

/// Body of `GET /login` and `GET /signup`
#[derive(Debug, Serialize)]
pub struct FormPageResponse {
    pub messages: Vec<FlashMessage>,
}

/// Who is logged in, if anyone.
pub async fn index(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, ApiError> {
    let user = state.auth.current_identity(&current.session).await?;
    Ok(respond(
        &state,
        &current,
        &current.session,
        Json(IndexResponse { user }),
    ))
}

/// Login form stand-in: hands out pending flash messages.
pub async fn login_page(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, ApiError> {
    form_page(state, current).await
}

/// Signup form stand-in: hands out pending flash messages.
pub async fn signup_page(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, ApiError> {
    form_page(state, current).await
}

async fn form_page(state: AppState, current: CurrentSession) -> Result<Response, ApiError> {
    let messages = state.flash.pop_all(&current.session).await?;
    Ok(respond(
        &state,
        &current,
        &current.session,
        Json(FormPageResponse { messages }),
    ))
}

/// Verify credentials and establish an authenticated session.
///
/// The password is checked before the session is touched, so a slow hash
/// never holds a session lock.
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    current: CurrentSession,
    Form(credentials): Form<Credentials>,
) -> Result<Response, ApiError> {
    match state.auth.authenticate(&credentials).await {
        Ok(identity) => {
            metrics::login_attempts_total(true);
            let session = state
                .sessions
                .attach_identity(&current.session, &identity)
                .await?;
            Ok(respond(&state, &current, &session, Redirect::to("/")))
        }
        Err(e) if e.is_credential_failure() => {
            metrics::login_attempts_total(false);
            logging::log_security_event(
                "failed_login",
                None,
                Some(request_id.as_str()),
                &e.to_string(),
            );
            flash_and_redirect(&state, &current, &e, "/login").await
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            Err(e.into())
        }
    }
}

/// Create an account and log straight into it.
pub async fn signup(
    State(state): State<AppState>,
    request_id: RequestId,
    current: CurrentSession,
    Form(credentials): Form<Credentials>,
) -> Result<Response, ApiError> {
    match state.auth.register(&credentials).await {
        Ok(identity) => {
            metrics::registrations_total(true);
            let session = state
                .sessions
                .attach_identity(&current.session, &identity)
                .await?;
            Ok(respond(&state, &current, &session, Redirect::to("/")))
        }
        Err(e) if e.is_credential_failure() => {
            metrics::registrations_total(false);
            logging::log_security_event(
                "rejected_signup",
                None,
                Some(request_id.as_str()),
                &e.to_string(),
            );
            flash_and_redirect(&state, &current, &e, "/signup").await
        }
        Err(e) => {
            metrics::registrations_total(false);
            Err(e.into())
        }
    }
}

/// Destroy the session and clear the cookie.
///
/// The cookie is cleared even when there was nothing to destroy.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, ApiError> {
    state.sessions.destroy(&current.session).await?;
    Ok(with_cleared_cookie(Redirect::to("/"), &state.cookie))
}

async fn flash_and_redirect(
    state: &AppState,
    current: &CurrentSession,
    error: &AuthError,
    to: &str,
) -> Result<Response, ApiError> {
    let session = state
        .flash
        .push_error(&current.session, error.client_message())
        .await?;
    Ok(respond(state, current, &session, Redirect::to(to)))
}

fn respond(
    state: &AppState,
    current: &CurrentSession,
    session: &Session,
    response: impl axum::response::IntoResponse,
) -> Response {
    with_session_cookie(response, &state.cookie, current.presented(), session)
}
