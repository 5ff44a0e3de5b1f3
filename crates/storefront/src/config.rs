//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Firebase (set both, or neither)
//! - `FIREBASE_API_KEY` - Web API key of the Firebase project
//! - `FIREBASE_PROJECT_ID` - Firebase project id (Firestore database owner)
//!
//! Without them the catalog and the cart still work; signing in and
//! buying are unavailable.
//!
//! ## Optional
//! - `SHOP_DATA_DIR` - Directory for the durable key-value store (default: .shop)
//! - `FIREBASE_AUTH_URL` - Identity Toolkit base URL (default: <https://identitytoolkit.googleapis.com>)
//! - `FIREBASE_TOKEN_URL` - Secure Token base URL (default: <https://securetoken.googleapis.com>)
//! - `FIRESTORE_URL` - Firestore REST base URL (default: <https://firestore.googleapis.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".shop";
const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory backing the durable key-value store
    pub data_dir: PathBuf,
    /// Firebase project configuration, absent when running offline
    pub firebase: Option<FirebaseConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Error event sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: SecretString,
    /// Project id
    pub project_id: String,
    /// Identity Toolkit base URL
    pub auth_url: Url,
    /// Secure Token base URL (ID token refresh)
    pub token_url: Url,
    /// Firestore REST base URL
    pub firestore_url: Url,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("firestore_url", &self.firestore_url.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, if only one of the
    /// Firebase variables is set, or if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(get_env_or_default("SHOP_DATA_DIR", DEFAULT_DATA_DIR));
        let firebase = FirebaseConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_sample_rate(
            "SENTRY_SAMPLE_RATE",
            &get_env_or_default("SENTRY_SAMPLE_RATE", "1.0"),
        )?;

        Ok(Self {
            data_dir,
            firebase,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some((api_key, project_id)) = credentials_pair(
            get_optional_env("FIREBASE_API_KEY"),
            get_optional_env("FIREBASE_PROJECT_ID"),
        )?
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            api_key,
            project_id,
            auth_url: parse_url(
                "FIREBASE_AUTH_URL",
                &get_env_or_default("FIREBASE_AUTH_URL", DEFAULT_AUTH_URL),
            )?,
            token_url: parse_url(
                "FIREBASE_TOKEN_URL",
                &get_env_or_default("FIREBASE_TOKEN_URL", DEFAULT_TOKEN_URL),
            )?,
            firestore_url: parse_url(
                "FIRESTORE_URL",
                &get_env_or_default("FIRESTORE_URL", DEFAULT_FIRESTORE_URL),
            )?,
        }))
    }
}

/// Pair up the Firebase API key and project id.
///
/// Neither set means offline; exactly one set is a mistake.
fn credentials_pair(
    api_key: Option<String>,
    project_id: Option<String>,
) -> Result<Option<(SecretString, String)>, ConfigError> {
    match (api_key, project_id) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar("FIREBASE_API_KEY".to_string())),
        (Some(api_key), Some(project_id)) => {
            validate_secret(&api_key, "FIREBASE_API_KEY")?;
            Ok(Some((SecretString::from(api_key), project_id)))
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_sample_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate = value
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Validate that a secret is not a placeholder.
fn validate_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "is empty".to_string(),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn firebase() -> FirebaseConfig {
        FirebaseConfig {
            api_key: SecretString::from("AIzaSyD-super-secret-api-key"),
            project_id: "e-cart-test".to_string(),
            auth_url: Url::parse(DEFAULT_AUTH_URL).unwrap(),
            token_url: Url::parse(DEFAULT_TOKEN_URL).unwrap(),
            firestore_url: Url::parse(DEFAULT_FIRESTORE_URL).unwrap(),
        }
    }

    #[test]
    fn test_validate_secret_placeholder() {
        let result = validate_secret("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_secret("changeme123", "TEST_VAR").is_err());
        assert!(validate_secret("   ", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_valid() {
        assert!(validate_secret("AIzaSyDytStROWnzOCHV3ZPjAuSkoMH3pTL", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_sample_rate_bounds() {
        assert!((parse_sample_rate("R", "0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_sample_rate("R", "1.5").is_err());
        assert!(parse_sample_rate("R", "abc").is_err());
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(parse_url("FIRESTORE_URL", "not a url").is_err());
    }

    #[test]
    fn test_firebase_config_debug_redacts_key() {
        let debug_output = format!("{:?}", firebase());

        assert!(debug_output.contains("e-cart-test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn test_firebase_is_optional_as_a_pair() {
        assert!(credentials_pair(None, None).unwrap().is_none());

        let (_, project_id) = credentials_pair(
            Some("AIzaSyDytStROWnzOCHV3ZPjAuSkoMH3pTL".to_string()),
            Some("e-cart".to_string()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(project_id, "e-cart");
    }

    #[test]
    fn test_half_configured_firebase_is_rejected() {
        assert!(matches!(
            credentials_pair(Some("AIzaSyDytStROWnzOCHV3ZPjAuSkoMH3pTL".to_string()), None),
            Err(ConfigError::MissingEnvVar(ref name)) if name == "FIREBASE_PROJECT_ID"
        ));
        assert!(matches!(
            credentials_pair(None, Some("e-cart".to_string())),
            Err(ConfigError::MissingEnvVar(ref name)) if name == "FIREBASE_API_KEY"
        ));
        assert!(matches!(
            credentials_pair(Some("your-api-key".to_string()), Some("e-cart".to_string())),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }
}
