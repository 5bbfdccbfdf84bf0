//! HTTP API for the login and session service.
//!
//! # Modules
//!
//! - [`auth`]: login, signup and logout handlers
//! - [`session`]: session cookie transport and the [`CurrentSession`] extractor
//! - [`request_id`]: request correlation and per-request metrics
//! - [`error`]: mapping of internal failures to responses
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /         - Current identity, or null (JSON)
//! GET  /login    - Pending flash messages for the login form (JSON)
//! POST /login    - Form login; 303 to / on success, to /login on failure
//! GET  /signup   - Pending flash messages for the signup form (JSON)
//! POST /signup   - Form signup; 303 to / on success, to /signup on failure
//! GET  /logout   - Destroy the session; 303 to /
//! GET  /health   - Health status
//! ```
//!
//! Every route resolves the caller's session from the cookie first. A missing
//! or expired session is never an error; the caller simply gets a fresh
//! anonymous one.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use gatehouse::{
//!     AuthService, FlashChannel, PasswordHasher, SessionConfig, SessionManager,
//!     db::MemoryUserRepository, session::MemorySessionStore,
//! };
//! use gh_server::api::{AppState, CookieConfig, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sessions = SessionManager::new(
//!     Arc::new(MemorySessionStore::new()),
//!     SessionConfig::default(),
//! );
//! let state = AppState {
//!     auth: AuthService::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         PasswordHasher::new("a-long-server-side-pepper"),
//!     ),
//!     flash: FlashChannel::new(sessions.clone()),
//!     sessions,
//!     cookie: CookieConfig::default(),
//!     database: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod request_id;
pub mod session;

pub use error::ApiError;
pub use session::{CookieConfig, CurrentSession};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use gatehouse::{AuthService, FlashChannel, SessionManager, db::Database};
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
///
/// # Fields
///
/// - `auth`: registration and credential checks
/// - `sessions`: session resolution, rotation and destruction
/// - `flash`: one-shot messages between requests
/// - `cookie`: session cookie name and attributes
/// - `database`: pool checked by `/health`; `None` when running on the
///   in-memory stores
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub sessions: SessionManager,
    pub flash: FlashChannel,
    pub cookie: CookieConfig,
    pub database: Option<Database>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", get(auth::logout))
        .route("/health", get(health_check))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers (or none is configured), and
/// `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","database":true,"version":"0.1.0","timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match &state.database {
        Some(db) => Some(db.health_check().await.is_ok()),
        None => None,
    };

    let overall_healthy = db_healthy.unwrap_or(true);

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if overall_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
