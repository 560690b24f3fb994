//! BFF configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_URL` - Commerce platform API base URL
//! - `COMMERCE_AUTH_URL` - Commerce platform OAuth base URL
//! - `COMMERCE_PROJECT_KEY` - Project key (first path segment of every API call)
//! - `COMMERCE_CLIENT_ID` - API client ID
//! - `COMMERCE_CLIENT_SECRET` - API client secret (high entropy)
//! - `PAYMENT_API_URL` - Payment gateway checkout API base URL
//! - `PAYMENT_API_KEY` - Payment gateway API key (high entropy)
//! - `PAYMENT_MERCHANT_ACCOUNT` - Merchant account name at the gateway
//!
//! ## Optional
//! - `BFF_HOST` - Bind address (default: 127.0.0.1)
//! - `BFF_PORT` - Listen port (default: 4000)
//! - `COMMERCE_SCOPES` - OAuth scopes (default: `manage_project:{project_key}`)
//! - `SHOP_LOCALE` - Locale for localized fields (default: en-GB)
//! - `SHOP_CURRENCY` - Currency for new carts and price selection (default: EUR)
//! - `SHOP_COUNTRY` - Country for new carts and price selection (default: DE)
//! - `PIM_ATTRIBUTE` - Variant attribute holding the PIM export (default: pimData)
//! - `PIM_CHANNEL` - PIM scope to prefer when reading values (default: ecommerce)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// BFF application configuration.
#[derive(Debug, Clone)]
pub struct BffConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Commerce platform API configuration
    pub commerce: CommerceConfig,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Shop-wide defaults (locale, currency, country)
    pub shop: ShopConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Emit JSON log lines
    pub json_logs: bool,
}

/// Commerce platform API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CommerceConfig {
    /// API base URL (e.g., `https://api.europe-west1.gcp.commercetools.com`)
    pub api_url: String,
    /// OAuth base URL (e.g., `https://auth.europe-west1.gcp.commercetools.com`)
    pub auth_url: String,
    /// Project key
    pub project_key: String,
    /// API client ID
    pub client_id: String,
    /// API client secret
    pub client_secret: SecretString,
    /// Space-separated OAuth scopes
    pub scopes: String,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("project_key", &self.project_key)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Payment gateway configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Checkout API base URL (e.g., `https://checkout-test.adyen.com/v71`)
    pub api_url: String,
    /// API key sent as `X-API-Key`
    pub api_key: SecretString,
    /// Merchant account the payments are booked on
    pub merchant_account: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("merchant_account", &self.merchant_account)
            .finish()
    }
}

/// Shop-wide defaults.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Locale used to resolve localized strings (e.g., en-GB)
    pub locale: String,
    /// Currency for new carts and price selection
    pub currency: String,
    /// Country for new carts and price selection
    pub country: String,
    /// Variant attribute holding the PIM export blob
    pub pim_attribute: String,
    /// PIM scope preferred when several values exist
    pub pim_channel: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            locale: "en-GB".to_string(),
            currency: "EUR".to_string(),
            country: "DE".to_string(),
            pim_attribute: "pimData".to_string(),
            pim_channel: "ecommerce".to_string(),
        }
    }
}

impl BffConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("BFF_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BFF_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BFF_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BFF_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            commerce: CommerceConfig::from_env()?,
            payment: PaymentConfig::from_env()?,
            shop: ShopConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let project_key = get_required_env("COMMERCE_PROJECT_KEY")?;
        let scopes = get_env_or_default("COMMERCE_SCOPES", &format!("manage_project:{project_key}"));
        Ok(Self {
            api_url: get_url("COMMERCE_API_URL")?,
            auth_url: get_url("COMMERCE_AUTH_URL")?,
            project_key,
            client_id: get_required_env("COMMERCE_CLIENT_ID")?,
            client_secret: get_validated_secret("COMMERCE_CLIENT_SECRET")?,
            scopes,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_url("PAYMENT_API_URL")?,
            api_key: get_validated_secret("PAYMENT_API_KEY")?,
            merchant_account: get_required_env("PAYMENT_MERCHANT_ACCOUNT")?,
        })
    }
}

impl ShopConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            locale: get_optional_env("SHOP_LOCALE").unwrap_or(defaults.locale),
            currency: get_optional_env("SHOP_CURRENCY").unwrap_or(defaults.currency),
            country: get_optional_env("SHOP_COUNTRY").unwrap_or(defaults.country),
            pim_attribute: get_optional_env("PIM_ATTRIBUTE").unwrap_or(defaults.pim_attribute),
            pim_channel: get_optional_env("PIM_CHANNEL").unwrap_or(defaults.pim_channel),
        }
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
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required base URL, validated and stripped of any trailing slash.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_base_url(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate a base URL and strip any trailing slash.
pub(crate) fn normalize_base_url(value: &str) -> Result<String, url::ParseError> {
    url::Url::parse(value)?;
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
