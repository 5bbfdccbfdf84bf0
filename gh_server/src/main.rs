//! Login and session server.
//!
//! Serves the form-based login flow over HTTP with PostgreSQL-backed users
//! and sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use gatehouse::{
    AuthService, FlashChannel, PasswordHasher, SessionManager,
    db::{Database, PgUserRepository},
    session::PgSessionStore,
};
use gh_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the gatehouse login and session server

USAGE:
  gh_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/gatehouse]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 PostgreSQL connection string
  PASSWORD_PEPPER              Password hashing pepper (required, 16+ chars)
  SESSION_TTL_SECS             Session lifetime [default: 86400]
  SESSION_ROLLING              Renew expiry on every request [default: true]
  SESSION_SWEEP_INTERVAL_SECS  Expired-session sweep interval [default: 900]
  SESSION_COOKIE_NAME          Session cookie name [default: sid]
  SESSION_COOKIE_SECURE        Mark the cookie Secure [default: false]
  METRICS_BIND                 Prometheus exporter address (disabled when unset)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    logging::init();
    info!("Starting gatehouse server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics exposed at http://{}/metrics", metrics_bind);
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    info!("Database connected successfully");

    let users = Arc::new(PgUserRepository::new(db.pool().clone()));
    let auth = AuthService::new(
        users,
        PasswordHasher::new(config.security.password_pepper.clone()),
    );

    let sessions = SessionManager::new(
        Arc::new(PgSessionStore::new(db.pool().clone())),
        config.session_config(),
    );
    let flash = FlashChannel::new(sessions.clone());

    let sweeper = sessions.spawn_sweeper(config.sweep_interval());
    info!(
        "Sessions: ttl {}s, rolling {}, sweep every {}s",
        config.session.ttl_secs, config.session.rolling, config.session.sweep_interval_secs
    );

    let state = AppState {
        auth,
        sessions,
        flash,
        cookie: config.cookie_config(),
        database: Some(db.clone()),
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    sweeper.abort();
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
