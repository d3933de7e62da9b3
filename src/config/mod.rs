//! Configuration management for the Web3 login server
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::auth::MessageMode;

/// Origins allowed by default: the local front-end dev servers.
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5001",
    "http://localhost:5173",
    "http://127.0.0.1:5001",
    "http://127.0.0.1:5173",
];

pub const DEFAULT_SIGN_IN_STATEMENT: &str = "Sign in to Web3 Login";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Invalid number for {name}: '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Interface to bind
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,

    /// How long an issued nonce stays valid
    pub nonce_ttl: Duration,

    /// How often expired nonces are swept from the store
    pub nonce_sweep_interval: Duration,

    /// Upper bound on a single signature verification
    pub verify_timeout: Duration,

    /// How strictly the signed message is matched against the issued challenge
    pub message_mode: MessageMode,

    /// First line of the sign-in message
    pub sign_in_statement: String,

    /// Whether the session cookie carries the `Secure` attribute
    pub session_cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = match lookup("HOST") {
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|_| {
                ConfigError::InvalidValue(format!("HOST must be an IP address, got '{}'", raw))
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = lookup("PORT")
            .unwrap_or_else(|| "3001".to_string())
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let nonce_ttl_seconds = parse_number(&lookup, "AUTH_NONCE_TTL_SECONDS", 300)?;
        if nonce_ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "AUTH_NONCE_TTL_SECONDS must be greater than zero".to_string(),
            ));
        }

        let sweep_interval_seconds =
            parse_number(&lookup, "AUTH_NONCE_SWEEP_INTERVAL_SECONDS", 60)?.max(1);

        let verify_timeout_ms = parse_number(&lookup, "AUTH_VERIFY_TIMEOUT_MS", 5000)?.max(1);

        let message_mode = match lookup("AUTH_MESSAGE_MODE") {
            Some(raw) => MessageMode::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "Invalid message mode: '{}'. Expected: strict or lenient",
                    raw
                ))
            })?,
            None => MessageMode::Strict,
        };

        let sign_in_statement = lookup("AUTH_SIGN_IN_STATEMENT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SIGN_IN_STATEMENT.to_string());

        let session_cookie_secure = match lookup("SESSION_COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "SESSION_COOKIE_SECURE must be true or false, got '{}'",
                    raw
                ))
            })?,
            None => environment.is_production(),
        };

        Ok(Config {
            environment,
            host,
            port,
            log_level,
            cors_allowed_origins,
            nonce_ttl: Duration::from_secs(nonce_ttl_seconds),
            nonce_sweep_interval: Duration::from_secs(sweep_interval_seconds),
            verify_timeout: Duration::from_millis(verify_timeout_ms),
            message_mode,
            sign_in_statement,
            session_cookie_secure,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_number<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::parse("staging").unwrap(), Environment::Staging);
        assert_eq!(Environment::parse("PROD").unwrap(), Environment::Production);
        assert_eq!(
            Environment::parse("production").unwrap(),
            Environment::Production
        );
        assert!(Environment::parse("invalid").is_err());
    }

    #[test]
    fn test_environment_as_str() {
        assert_eq!(Environment::Development.as_str(), "development");
        assert_eq!(Environment::Staging.as_str(), "staging");
        assert_eq!(Environment::Production.as_str(), "production");
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 3001);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.cors_allowed_origins.len(), DEFAULT_CORS_ORIGINS.len());
        assert_eq!(config.nonce_ttl, Duration::from_secs(300));
        assert_eq!(config.nonce_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.verify_timeout, Duration::from_millis(5000));
        assert_eq!(config.message_mode, MessageMode::Strict);
        assert_eq!(config.sign_in_statement, DEFAULT_SIGN_IN_STATEMENT);
        assert!(!config.session_cookie_secure);
    }

    #[test]
    fn test_production_defaults_to_secure_cookie() {
        let config = config_from(&[("ENVIRONMENT", "prod")]).unwrap();
        assert!(config.session_cookie_secure);

        let config =
            config_from(&[("ENVIRONMENT", "prod"), ("SESSION_COOKIE_SECURE", "false")]).unwrap();
        assert!(!config.session_cookie_secure);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "https://app.example.com, https://admin.example.com ,"),
            ("AUTH_NONCE_TTL_SECONDS", "120"),
            ("AUTH_VERIFY_TIMEOUT_MS", "250"),
            ("AUTH_MESSAGE_MODE", "lenient"),
            ("AUTH_SIGN_IN_STATEMENT", "Sign in to Example"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.nonce_ttl, Duration::from_secs(120));
        assert_eq!(config.verify_timeout, Duration::from_millis(250));
        assert_eq!(config.message_mode, MessageMode::Lenient);
        assert_eq!(config.sign_in_statement, "Sign in to Example");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("PORT", "not-a-port")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[("AUTH_NONCE_TTL_SECONDS", "abc")]),
            Err(ConfigError::InvalidNumber { name: "AUTH_NONCE_TTL_SECONDS", .. })
        ));
        assert!(config_from(&[("AUTH_NONCE_TTL_SECONDS", "0")]).is_err());
        assert!(config_from(&[("AUTH_MESSAGE_MODE", "loose")]).is_err());
        assert!(config_from(&[("SESSION_COOKIE_SECURE", "maybe")]).is_err());
        assert!(config_from(&[("HOST", "localhost:80")]).is_err());
    }
}
