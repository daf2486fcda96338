//! Process configuration, loaded once at startup.

use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dashgate_auth::credentials::DEFAULT_MIN_PASSWORD_LENGTH;
use dashgate_auth::token::DEFAULT_SESSION_TTL_DAYS;
use dashgate_observability::LogFormat;

pub const MIN_SECRET_BYTES: usize = 32;
/// Longest session lifetime accepted from the environment (one year).
pub const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),

    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),

    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub auth_secret: SecretString,
    pub identity_backend_url: String,
    pub identity_backend_timeout: StdDuration,
    pub session_ttl: Duration,
    pub min_password_length: usize,
    pub session_cookie_secure: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let auth_secret = get("AUTH_SECRET").ok_or(ConfigError::MissingVar("AUTH_SECRET"))?;
        let auth_secret = SecretString::new(auth_secret.into());
        if auth_secret.expose_secret().len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidVar("AUTH_SECRET"));
        }

        let identity_backend_url = get("IDENTITY_BACKEND_URL")
            .ok_or(ConfigError::MissingVar("IDENTITY_BACKEND_URL"))?;

        let listen_addr = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let session_ttl_secs = parse_or("SESSION_TTL_SECS", get("SESSION_TTL_SECS"), || {
            DEFAULT_SESSION_TTL_DAYS * 24 * 60 * 60
        })?;
        let session_ttl = (1..=MAX_SESSION_TTL_SECS)
            .contains(&session_ttl_secs)
            .then(|| Duration::try_seconds(session_ttl_secs))
            .flatten()
            .ok_or(ConfigError::InvalidVar("SESSION_TTL_SECS"))?;

        let min_password_length = parse_or("MIN_PASSWORD_LENGTH", get("MIN_PASSWORD_LENGTH"), || {
            DEFAULT_MIN_PASSWORD_LENGTH
        })?;

        let timeout_ms = parse_or(
            "IDENTITY_BACKEND_TIMEOUT_MS",
            get("IDENTITY_BACKEND_TIMEOUT_MS"),
            || DEFAULT_BACKEND_TIMEOUT_MS,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidVar("IDENTITY_BACKEND_TIMEOUT_MS"));
        }

        let session_cookie_secure =
            parse_or("SESSION_COOKIE_SECURE", get("SESSION_COOKIE_SECURE"), || false)?;

        let log_format = match get("LOG_FORMAT") {
            Some(v) => LogFormat::parse(&v).ok_or(ConfigError::InvalidVar("LOG_FORMAT"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            listen_addr,
            auth_secret,
            identity_backend_url,
            identity_backend_timeout: StdDuration::from_millis(timeout_ms),
            session_ttl,
            min_password_length,
            session_cookie_secure,
            log_format,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidVar(key)),
        None => Ok(default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use dashgate_auth::{Identity, Role, SessionTokenCodec};
    use dashgate_core::UserId;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_to_optional_values() {
        let config = load(&[
            ("AUTH_SECRET", SECRET),
            ("IDENTITY_BACKEND_URL", "http://identity.internal"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.session_ttl, Duration::days(7));
        assert_eq!(config.min_password_length, 6);
        assert_eq!(config.identity_backend_timeout, StdDuration::from_secs(10));
        assert!(!config.session_cookie_secure);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn required_values_must_be_present() {
        assert_eq!(
            load(&[("IDENTITY_BACKEND_URL", "http://x")]).unwrap_err(),
            ConfigError::MissingVar("AUTH_SECRET")
        );
        assert_eq!(
            load(&[("AUTH_SECRET", SECRET), ("IDENTITY_BACKEND_URL", "  ")]).unwrap_err(),
            ConfigError::MissingVar("IDENTITY_BACKEND_URL")
        );
    }

    #[test]
    fn short_secret_is_rejected() {
        assert_eq!(
            load(&[("AUTH_SECRET", "dev-secret"), ("IDENTITY_BACKEND_URL", "http://x")]).unwrap_err(),
            ConfigError::InvalidVar("AUTH_SECRET")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("AUTH_SECRET", SECRET),
            ("IDENTITY_BACKEND_URL", "http://x"),
            ("SESSION_TTL_SECS", "3600"),
            ("MIN_PASSWORD_LENGTH", "12"),
            ("IDENTITY_BACKEND_TIMEOUT_MS", "250"),
            ("SESSION_COOKIE_SECURE", "true"),
            ("LOG_FORMAT", "text"),
        ])
        .unwrap();

        assert_eq!(config.session_ttl, Duration::hours(1));
        assert_eq!(config.min_password_length, 12);
        assert_eq!(config.identity_backend_timeout, StdDuration::from_millis(250));
        assert!(config.session_cookie_secure);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn longest_accepted_ttl_still_issues_sessions() {
        let max = MAX_SESSION_TTL_SECS.to_string();
        let config = load(&[
            ("AUTH_SECRET", SECRET),
            ("IDENTITY_BACKEND_URL", "http://x"),
            ("SESSION_TTL_SECS", max.as_str()),
        ])
        .unwrap();
        assert_eq!(config.session_ttl, Duration::days(365));

        let identity = Identity {
            id: UserId::new(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            organization_id: None,
            role: Role::default(),
            onboarding_completed: true,
        };
        let codec = SessionTokenCodec::new(&config.auth_secret).unwrap();
        let issued = codec
            .issue(&identity, None, config.session_ttl, chrono::Utc::now())
            .unwrap();
        assert_eq!(issued.claims.expires_at - issued.claims.issued_at, Duration::days(365));
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        for (key, value) in [
            ("SESSION_TTL_SECS", "0"),
            ("SESSION_TTL_SECS", "a week"),
            ("SESSION_TTL_SECS", "100000000000000"),
            ("SESSION_TTL_SECS", "9223372036854775807"),
            ("SESSION_TTL_SECS", "-9223372036854775808"),
            ("MIN_PASSWORD_LENGTH", "-1"),
            ("IDENTITY_BACKEND_TIMEOUT_MS", "0"),
            ("SESSION_COOKIE_SECURE", "yes"),
            ("LOG_FORMAT", "xml"),
        ] {
            let err = load(&[("AUTH_SECRET", SECRET), ("IDENTITY_BACKEND_URL", "http://x"), (key, value)])
                .unwrap_err();
            assert_eq!(err, ConfigError::InvalidVar(key), "{key}={value}");
        }
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = load(&[("AUTH_SECRET", SECRET), ("IDENTITY_BACKEND_URL", "http://x")]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
