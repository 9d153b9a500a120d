//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - PostgreSQL connection string; without it the service
//!   runs on the in-memory store
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8083)
//! - `JWT_SECRET` - Token signing secret, min 32 bytes; required with a database
//! - `TOKEN_TTL_DAYS` - Token lifetime (default: 7)
//! - `NATS_URL` - Event bus; events are dropped when unset
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Admin account created at start-up
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub token_ttl_days: i64,
    pub nats_url: Option<String>,
    pub admin: Option<AdminBootstrap>,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = optional("DATABASE_URL").map(SecretString::from);
        let host = parse_or(&optional, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&optional, "PORT", 8083u16)?;
        let token_ttl_days = parse_or(&optional, "TOKEN_TTL_DAYS", 7i64)?;
        if token_ttl_days < 1 {
            return Err(ConfigError::InvalidEnvVar("TOKEN_TTL_DAYS".into(), "must be at least 1".into()));
        }
        let db_max_connections = parse_or(&optional, "DB_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => {
                let secret = SecretString::from(secret);
                validate_secret(&secret, "JWT_SECRET")?;
                secret
            }
            None if database_url.is_some() => return Err(ConfigError::MissingEnvVar("JWT_SECRET".into())),
            None => random_secret(),
        };

        let admin = match (optional("ADMIN_EMAIL"), get("ADMIN_PASSWORD").filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password: SecretString::from(password) }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD".into())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("ADMIN_EMAIL".into())),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl_days,
            nats_url: optional("NATS_URL"),
            admin,
            db_max_connections,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn validate_secret(secret: &SecretString, name: &str) -> Result<(), ConfigError> {
    let len = secret.expose_secret().len();
    if len < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_string(),
            format!("must be at least {MIN_JWT_SECRET_LENGTH} bytes, got {len}"),
        ));
    }
    Ok(())
}

/// Per-process secret for database-less runs; tokens die with the process.
fn random_secret() -> SecretString {
    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    SecretString::from(URL_SAFE_NO_PAD.encode(bytes))
}
