//! Client configuration for talking to a conversion server.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default request timeout applied to every backend call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings shared by the auth, upload, and gallery clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    legacy_upload: bool,
}

impl ClientConfig {
    /// Build a config from a raw base URL, validating and normalizing it.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            legacy_upload: false,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route submissions through the single legacy `/upload` endpoint
    /// instead of the per-kind routes.
    #[must_use]
    pub const fn with_legacy_upload(mut self, legacy: bool) -> Self {
        self.legacy_upload = legacy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub const fn legacy_upload(&self) -> bool {
        self.legacy_upload
    }

    /// Join a route (starting with `/`) onto the base URL.
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput(
            "server URL must not be empty".to_string(),
        ));
    }
    if !crate::util::is_http_url(&base) {
        return Err(Error::InvalidInput(
            "server URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_rejects_invalid_values() {
        assert!(ClientConfig::new("").is_err());
        assert!(ClientConfig::new("example.com").is_err());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let config = ClientConfig::new("https://convert.example.com/").unwrap();
        assert_eq!(config.base_url(), "https://convert.example.com");
        assert_eq!(
            config.endpoint("/upload/audio"),
            "https://convert.example.com/upload/audio"
        );
    }

    #[test]
    fn defaults_are_applied() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.legacy_upload());
    }

    #[test]
    fn builders_override_defaults() {
        let config = ClientConfig::new("http://localhost:5000")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_legacy_upload(true);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.legacy_upload());
    }
}
