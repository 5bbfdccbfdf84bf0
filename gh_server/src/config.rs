//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use gatehouse::{SessionConfig, db::DatabaseConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::api::CookieConfig;

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Longest accepted session lifetime (10 years)
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session lifetime and cookie settings
    pub session: SessionSettings,
    /// Prometheus exporter address; metrics stay off when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("password_pepper", &"<redacted>")
            .finish()
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Session lifetime in seconds
    pub ttl_secs: u64,
    /// Renew the expiry on every request
    pub rolling: bool,
    /// Seconds between expired-session sweeps
    pub sweep_interval_secs: u64,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Add the `Secure` attribute to the session cookie
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_opt("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        // Database configuration
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| DatabaseConfig::default().database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 2),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 10),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        // Security configuration (REQUIRED)
        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let security = SecurityConfig { password_pepper };

        let defaults = SessionConfig::default();
        let session = SessionSettings {
            ttl_secs: parse_env_or("SESSION_TTL_SECS", defaults.ttl.as_secs()),
            rolling: parse_env_or("SESSION_ROLLING", defaults.rolling),
            sweep_interval_secs: parse_env_or(
                "SESSION_SWEEP_INTERVAL_SECS",
                gatehouse::session::DEFAULT_SWEEP_INTERVAL.as_secs(),
            ),
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| CookieConfig::default().name),
            cookie_secure: parse_env_or("SESSION_COOKIE_SECURE", false),
        };

        let metrics_bind = parse_env_opt("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            security,
            session,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_SECS".to_string(),
                reason: format!("Must be at most {} (10 years)", MAX_SESSION_TTL_SECS),
            });
        }

        if self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_SWEEP_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if !is_cookie_name(&self.session.cookie_name) {
            return Err(ConfigError::Invalid {
                var: "SESSION_COOKIE_NAME".to_string(),
                reason: "Must be non-empty and contain only letters, digits, '-' or '_'"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Session lifetime policy for the session manager
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: Duration::from_secs(self.session.ttl_secs),
            rolling: self.session.rolling,
        }
    }

    /// Cookie transport settings for the router
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: self.session.cookie_name.clone(),
            secure: self.session.cookie_secure,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable, rejecting values that are present but malformed
fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig {
                database_url: "test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            security: SecurityConfig {
                password_pepper: "a".repeat(16),
            },
            session: SessionSettings {
                ttl_secs: 3600,
                rolling: true,
                sweep_interval_secs: 60,
                cookie_name: "sid".to_string(),
                cookie_secure: false,
            },
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "PASSWORD_PEPPER".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PASSWORD_PEPPER"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_pepper() {
        let mut config = valid_config();
        config.security.password_pepper = "short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "PASSWORD_PEPPER"));
    }

    #[test]
    fn test_config_validation_zero_ttl() {
        let mut config = valid_config();
        config.session.ttl_secs = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SESSION_TTL_SECS"));
    }

    #[test]
    fn test_config_validation_ttl_upper_bound() {
        let mut config = valid_config();
        config.session.ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        config.session.ttl_secs = 10_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SESSION_TTL_SECS"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = valid_config();
        config.database.min_connections = 50;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_cookie_name() {
        let mut config = valid_config();
        for bad in ["", "sid;", "my sid", "a=b"] {
            config.session.cookie_name = bad.to_string();
            assert!(config.validate().is_err(), "{bad:?} should be rejected");
        }

        config.session.cookie_name = "gatehouse_sid-1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_session_settings() {
        let config = valid_config();
        let session = config.session_config();
        assert_eq!(session.ttl, Duration::from_secs(3600));
        assert!(session.rolling);
        assert_eq!(config.cookie_config().name, "sid");
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_security_config_debug_redacts_pepper() {
        let config = valid_config();
        let debug = format!("{:?}", config.security);
        assert!(!debug.contains(&config.security.password_pepper));
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        let value: u32 = parse_env_or("GATEHOUSE_TEST_UNSET_VARIABLE", 7);
        assert_eq!(value, 7);
    }
}
