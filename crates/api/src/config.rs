use std::str::FromStr;

use autoservice_core::provisioning::{ProvisioningConfig, DEFAULT_ADMIN_USERNAME};

use crate::auth::jwt::JwtConfig;

/// A required variable is missing or a value does not parse.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` and `JWT_SECRET` has a default suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`         | required                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|origin| origin.parse::<axum::http::HeaderValue>().is_err())
        {
            return Err(ConfigError::Invalid {
                name: "CORS_ORIGINS",
                reason: format!("'{bad}' is not a valid header value"),
            });
        }

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30)?;
        let database_url = required_var("DATABASE_URL")?;
        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
        })
    }
}

/// Seed credentials for the operator account.
///
/// | Env Var           | Default  |
/// |-------------------|----------|
/// | `ADMIN_USERNAME`  | `admin`  |
/// | `ADMIN_PASSWORD`  | required |
/// | `ADMIN_FULL_NAME` | unset    |
pub fn provisioning_from_env() -> Result<ProvisioningConfig, ConfigError> {
    Ok(ProvisioningConfig {
        admin_username: std::env::var("ADMIN_USERNAME")
            .unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.into()),
        admin_password: required_var("ADMIN_PASSWORD")?,
        admin_full_name: std::env::var("ADMIN_FULL_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty()),
    })
}

/// Read a variable that must be present and non-empty.
pub(crate) fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Read and parse a variable, falling back to `default` when it is unset.
pub(crate) fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
