//! Session cookie transport.
//!
//! The cookie carries the raw session token and nothing else. Handlers take a
//! [`CurrentSession`] to get the resolved session, do their work, and then
//! hand the resulting session to [`with_session_cookie`], which decides
//! whether the cookie must be set, refreshed or cleared.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use gatehouse::Session;

use super::{AppState, error::ApiError};

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "sid";

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,
    /// Add the `Secure` attribute; enable when served over HTTPS
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            secure: false,
        }
    }
}

/// The caller's session, resolved from the request cookie.
///
/// Resolution never rejects a request for a bad or stale cookie; only a
/// storage failure turns into an error response.
pub struct CurrentSession {
    pub session: Session,
    presented: Option<String>,
}

impl CurrentSession {
    /// The token the client sent, if any
    pub fn presented(&self) -> Option<&str> {
        self.presented.as_deref()
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = extract_session_token(&parts.headers, &state.cookie.name);
        let session = state.sessions.resolve(presented.as_deref()).await?;
        Ok(Self { session, presented })
    }
}

/// Attach whatever `Set-Cookie` the outcome of the request calls for.
///
/// - A stored session whose token differs from the presented one (new or
///   rotated) gets the cookie.
/// - A rolling session gets it again on every request, with a renewed
///   `Max-Age`.
/// - An unstored session gets nothing, except that a presented token which
///   no longer resolves is cleared.
pub fn with_session_cookie(
    response: impl IntoResponse,
    config: &CookieConfig,
    presented: Option<&str>,
    session: &Session,
) -> Response {
    let mut response = response.into_response();

    let cookie = if session.is_new {
        presented.map(|_| clear_session_cookie(config))
    } else if presented != Some(session.token.as_str()) || session.rolling {
        let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
        Some(session_cookie(config, &session.token, max_age))
    } else {
        None
    };

    match cookie {
        Some(Ok(value)) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Some(Err(e)) => tracing::error!("Failed to build session cookie: {}", e),
        None => {}
    }

    response
}

/// Attach a cookie that removes the session cookie from the client
pub fn with_cleared_cookie(response: impl IntoResponse, config: &CookieConfig) -> Response {
    let mut response = response.into_response();
    match clear_session_cookie(config) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Failed to build session cookie: {}", e),
    }
    response
}

/// Build an `HttpOnly` cookie for the session token.
pub fn session_cookie(
    config: &CookieConfig,
    token: &str,
    max_age_secs: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}",
        config.name
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_session_cookie(config: &CookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.name);
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the session token from the `Cookie` header(s).
///
/// An empty value counts as absent.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
