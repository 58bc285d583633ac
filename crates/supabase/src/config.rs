//! Supabase project configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Project URL (e.g., `https://abc123.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key (safe to expose to browsers)
//!
//! ## Optional
//! - `SUPABASE_SERVICE_ROLE_KEY` - Privileged key for catalog writes and
//!   storage uploads; required by the admin binary and the CLI, never by
//!   the public storefront

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
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

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the service-role key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash.
    pub project_url: String,
    /// Public anon key, sent as the `apikey` header on every request.
    pub anon_key: String,
    /// Service-role key for privileged writes. Bypasses row-level security,
    /// so it must never be linked into the public storefront.
    pub service_role_key: Option<SecretString>,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("project_url", &self.project_url)
            .field("anon_key", &self.anon_key)
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SupabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SUPABASE_URL` or `SUPABASE_ANON_KEY` is
    /// missing or invalid, or if a provided service-role key fails the
    /// placeholder/entropy validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project_url = get_required_env("SUPABASE_URL")?;
        let project_url = validate_project_url(&project_url)?;
        let anon_key = get_required_env("SUPABASE_ANON_KEY")?;

        let service_role_key = match std::env::var("SUPABASE_SERVICE_ROLE_KEY") {
            Ok(value) => {
                validate_secret_strength(&value, "SUPABASE_SERVICE_ROLE_KEY")?;
                Some(SecretString::from(value))
            }
            Err(_) => None,
        };

        Ok(Self {
            project_url,
            anon_key,
            service_role_key,
        })
    }

    /// The service-role key, or an error for callers that require one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no key is configured.
    pub fn require_service_role_key(&self) -> Result<&SecretString, ConfigError> {
        self.service_role_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_SERVICE_ROLE_KEY".to_string()))
    }

    /// Base URL for the REST (PostgREST) API.
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.project_url)
    }

    /// Base URL for the auth (GoTrue) API.
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.project_url)
    }

    /// Base URL for the storage API.
    #[must_use]
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.project_url)
    }

    /// Expose the service-role key for request building.
    ///
    /// Internal convenience over `require_service_role_key`.
    pub(crate) fn service_role_token(&self) -> Option<String> {
        self.service_role_key
            .as_ref()
            .map(|key| key.expose_secret().to_string())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Validate the project URL and strip any trailing slash.
fn validate_project_url(url: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            "SUPABASE_URL".to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    Ok(url.trim_end_matches('/').to_string())
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real service keys are signed JWTs with high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the project dashboard."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_url_strips_trailing_slash() {
        let url = validate_project_url("https://abc123.supabase.co/").unwrap();
        assert_eq!(url, "https://abc123.supabase.co");
    }

    #[test]
    fn test_validate_project_url_rejects_garbage() {
        assert!(validate_project_url("not a url").is_err());
        assert!(validate_project_url("ftp://abc123.supabase.co").is_err());
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-service-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string shaped like a JWT fragment
        let result = validate_secret_strength("eyJhbGciOiJIUzI1NiJ9.aB3$xY9!mK2@nL5#pQ7&rT0", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_api_urls() {
        let config = SupabaseConfig {
            project_url: "https://abc123.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: None,
        };
        assert_eq!(config.rest_url(), "https://abc123.supabase.co/rest/v1");
        assert_eq!(config.auth_url(), "https://abc123.supabase.co/auth/v1");
        assert_eq!(
            config.storage_url(),
            "https://abc123.supabase.co/storage/v1"
        );
    }

    #[test]
    fn test_debug_redacts_service_key() {
        let config = SupabaseConfig {
            project_url: "https://abc123.supabase.co".to_string(),
            anon_key: "anon_key_value".to_string(),
            service_role_key: Some(SecretString::from("super_secret_service_key")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("anon_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_service_key"));
    }

    #[test]
    fn test_require_service_role_key_missing() {
        let config = SupabaseConfig {
            project_url: "https://abc123.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: None,
        };
        assert!(config.require_service_role_key().is_err());
    }
}
