//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_API_URL` - Backend base URL (e.g., `https://qkart.example.com/api/v1`)
//!
//! ## Optional
//! - `QKART_AUTH_TOKEN` - Bearer token of the logged-in user
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce window (default: 500)
//! - `QKART_SEARCH_MAX_WAIT_MS` - Longest a search burst may be held back
//!   (default: the debounce window; `0` disables the cap)
//! - `QKART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300; `0` disables)
//! - `QKART_ORPHAN_POLICY` - `keep` or `drop` cart records missing from the catalog
//!   (default: keep)

use std::time::Duration;

use qkart_core::OrphanPolicy;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DEBOUNCE_MS: &str = "500";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront engine configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL; endpoint paths are appended to it
    pub api_url: Url,
    /// Bearer token for cart operations, if a user is logged in
    pub auth_token: Option<SecretString>,
    /// Search debounce settings
    pub search: SearchConfig,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Handling of cart records whose product is not in the catalog
    pub orphan_policy: OrphanPolicy,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("search", &self.search)
            .field("http", &self.http)
            .field("orphan_policy", &self.orphan_policy)
            .finish()
    }
}

/// Search debounce settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is sent
    pub debounce: Duration,
    /// Upper bound on how long a continuous burst may delay its search
    pub max_wait: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let debounce = Duration::from_millis(500);
        Self {
            debounce,
            max_wait: Some(debounce),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// How long a fetched catalog is served from memory; `None` disables caching
    pub catalog_cache_ttl: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Some(Duration::from_secs(300)),
        }
    }
}

impl StorefrontConfig {
    /// Configuration for `api_url` with every optional setting at its default.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            auth_token: None,
            search: SearchConfig::default(),
            http: HttpConfig::default(),
            orphan_policy: OrphanPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(&get_required_env(&lookup, "QKART_API_URL")?)?;
        let auth_token = get_optional_env(&lookup, "QKART_AUTH_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);

        let debounce = Duration::from_millis(parse_env(
            &lookup,
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_DEBOUNCE_MS,
        )?);
        // Unset means "same as the window"; an explicit 0 disables the cap
        let max_wait = match get_optional_env(&lookup, "QKART_SEARCH_MAX_WAIT_MS") {
            None => Some(debounce),
            Some(raw) => {
                let ms = parse_value::<u64>("QKART_SEARCH_MAX_WAIT_MS", &raw)?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
        };

        let timeout = Duration::from_secs(parse_env(
            &lookup,
            "QKART_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "QKART_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let ttl_secs: u64 = parse_env(
            &lookup,
            "QKART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;
        let catalog_cache_ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));

        let orphan_policy = get_env_or_default(&lookup, "QKART_ORPHAN_POLICY", "keep")
            .parse::<OrphanPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("QKART_ORPHAN_POLICY".to_string(), e))?;

        Ok(Self {
            api_url,
            auth_token,
            search: SearchConfig { debounce, max_wait },
            http: HttpConfig {
                timeout,
                catalog_cache_ttl,
            },
            orphan_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
}

/// Get an environment variable with a default value.
fn get_env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(lookup, key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the backend base URL, accepting only HTTP(S).
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("QKART_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "QKART_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
