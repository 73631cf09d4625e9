//! Access layer configuration

use std::time::Duration;

use crate::error::{AccessError, AccessResult};

/// Access layer configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LYTOTEC_BACKEND_URL | http://localhost:54321 | Hosted backend base URL |
/// | LYTOTEC_API_KEY | (empty) | Public API key sent as `apikey` |
/// | LYTOTEC_REQUEST_TIMEOUT_MS | 3000 | Per-request timeout |
/// | LYTOTEC_PERMISSION_CACHE_TTL_SECS | 60 | Permission cache freshness |
/// | LYTOTEC_LOG_LEVEL | info | Default log level |
/// | LYTOTEC_LOG_JSON | false | JSON log output |
/// | LYTOTEC_LOG_DIR | (unset) | Daily rolling log directory |
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Backend base URL (e.g. "https://project.supabase.co")
    pub backend_url: String,

    /// Public API key
    pub api_key: String,

    /// Session access token, when a user is signed in
    pub access_token: Option<String>,

    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Permission cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Log level filter
    pub log_level: String,

    /// Emit JSON logs
    pub log_json: bool,

    /// Directory for rolling log files
    pub log_dir: Option<String>,
}

impl AccessConfig {
    /// Create a configuration for the given backend with defaults
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            api_key: String::new(),
            access_token: None,
            request_timeout_ms: 3000,
            cache_ttl_secs: 60,
            log_level: "info".to_string(),
            log_json: false,
            log_dir: None,
        }
    }

    /// Load configuration from the environment (and `.env` when present)
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::new("http://localhost:54321");
        Self {
            backend_url: std::env::var("LYTOTEC_BACKEND_URL").unwrap_or(defaults.backend_url),
            api_key: std::env::var("LYTOTEC_API_KEY").unwrap_or_default(),
            access_token: std::env::var("LYTOTEC_ACCESS_TOKEN").ok(),
            request_timeout_ms: std::env::var("LYTOTEC_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            cache_ttl_secs: std::env::var("LYTOTEC_PERMISSION_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            log_level: std::env::var("LYTOTEC_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: std::env::var("LYTOTEC_LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LYTOTEC_LOG_DIR").ok(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the session access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, millis: u64) -> Self {
        self.request_timeout_ms = millis;
        self
    }

    /// Set the permission cache TTL
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cache TTL as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Check the configuration before building clients
    pub fn validate(&self) -> AccessResult<()> {
        let url = self.backend_url.trim();
        if url.is_empty() {
            return Err(AccessError::Config("backend URL is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AccessError::Config(format!(
                "backend URL must be http(s): {}",
                url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(AccessError::Config("request timeout must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = AccessConfig::new("https://lytotec.example.com")
            .with_api_key("anon")
            .with_access_token("jwt")
            .with_timeout_ms(500)
            .with_cache_ttl_secs(5);

        assert_eq!(config.api_key, "anon");
        assert_eq!(config.access_token.as_deref(), Some("jwt"));
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AccessConfig::new("").validate().is_err());
        assert!(AccessConfig::new("ftp://host").validate().is_err());
        assert!(
            AccessConfig::new("http://host")
                .with_timeout_ms(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_defaults() {
        let config = AccessConfig::new("http://localhost:54321");
        assert_eq!(config.request_timeout_ms, 3000);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.log_level, "info");
        assert!(config.access_token.is_none());
    }
}
