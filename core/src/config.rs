//! Client configuration and caller identity.

use std::env;

/// Default hosted backend, used when `MARKET_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://backend-api-729553473022.us-central1.run.app/v1";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "MARKET_API_URL";

/// Where the client talks to.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Configuration for an explicit base URL. A trailing slash is stripped
    /// so path formatting stays uniform.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Configuration from `MARKET_API_URL`, falling back to the hosted
    /// backend.
    pub fn from_env() -> Self {
        match env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::new(&url),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// The user the caller is acting as.
///
/// Passed explicitly to the operations that are relative to a user (inbox,
/// thread view) instead of living in a global. UI layers typically hold one
/// `Session` per signed-in account and hand out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
