//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TAMARIND_API_BASE_URL` - Base URL of the store API (e.g., <http://localhost:8082/api/v1>)
//!
//! ## Optional
//! - `TAMARIND_SEARCH_DEBOUNCE_MS` - Search debounce window in milliseconds (default: 500)
//! - `TAMARIND_SHIPPING_FEE` - Flat shipping fee applied to non-empty carts (default: 0)
//! - `TAMARIND_CATALOG_CACHE_TTL_SECS` - Catalog response cache TTL; 0 disables (default: 300)
//! - `TAMARIND_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `TAMARIND_SESSION_FILE` - Path of the persisted session file (default: .tamarind/session.json)
//! - `TAMARIND_SENTRY_DSN` - Sentry error tracking DSN
//! - `TAMARIND_SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

const DEFAULT_SEARCH_DEBOUNCE_MS: &str = "500";
const DEFAULT_SHIPPING_FEE: &str = "0";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "10";
const DEFAULT_SESSION_FILE: &str = ".tamarind/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote store API, including any path prefix
    pub api_base_url: Url,
    /// How long search input must be idle before a request is sent
    pub search_debounce: Duration,
    /// Flat shipping fee applied to non-empty carts
    pub shipping_fee: Decimal,
    /// TTL for the cached full-catalog response; zero disables caching
    pub catalog_cache_ttl: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Where the login session is persisted between runs
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_url("TAMARIND_API_BASE_URL", &get_required_env("TAMARIND_API_BASE_URL")?)?;
        let search_debounce = parse_millis(
            "TAMARIND_SEARCH_DEBOUNCE_MS",
            &get_env_or_default("TAMARIND_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS),
        )?;
        let shipping_fee = parse_fee(
            "TAMARIND_SHIPPING_FEE",
            &get_env_or_default("TAMARIND_SHIPPING_FEE", DEFAULT_SHIPPING_FEE),
        )?;
        let catalog_cache_ttl = parse_secs(
            "TAMARIND_CATALOG_CACHE_TTL_SECS",
            &get_env_or_default("TAMARIND_CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_CACHE_TTL_SECS),
        )?;
        let request_timeout = parse_secs(
            "TAMARIND_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("TAMARIND_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
        )?;
        let session_file =
            PathBuf::from(get_env_or_default("TAMARIND_SESSION_FILE", DEFAULT_SESSION_FILE));
        let sentry_dsn = get_optional_env("TAMARIND_SENTRY_DSN");
        let sentry_environment = get_optional_env("TAMARIND_SENTRY_ENVIRONMENT");

        Ok(Self {
            api_base_url,
            search_debounce,
            shipping_fee,
            catalog_cache_ttl,
            request_timeout,
            session_file,
            sentry_dsn,
            sentry_environment,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a non-negative decimal fee.
fn parse_fee(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    let fee = value
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if fee < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must not be negative (got {fee})"),
        ));
    }
    Ok(fee)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_valid() {
        let url = parse_url("TEST_URL", "http://localhost:8082/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8082/api/v1");
    }

    #[test]
    fn test_parse_url_invalid() {
        let result = parse_url("TEST_URL", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(
            parse_millis("TEST_MS", "500").unwrap(),
            Duration::from_millis(500)
        );
        assert!(parse_millis("TEST_MS", "half a second").is_err());
    }

    #[test]
    fn test_parse_secs_zero_allowed() {
        assert_eq!(parse_secs("TEST_SECS", "0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_fee_valid() {
        assert_eq!(parse_fee("TEST_FEE", "4.99").unwrap().to_string(), "4.99");
        assert_eq!(parse_fee("TEST_FEE", "0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_fee_negative() {
        let result = parse_fee("TEST_FEE", "-1");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_fee_garbage() {
        assert!(parse_fee("TEST_FEE", "free").is_err());
    }
}
