//! Configuration options for the storefront client

use std::time::Duration;

use storefront_auth::options::{DEFAULT_API_URL, DEFAULT_GOOGLE_USERINFO_URL};
use storefront_auth::session::MAX_SESSION_AGE;
use storefront_auth::AuthOptions;

use crate::error::Error;

/// Configuration options for the storefront client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The storefront API base URL
    pub api_url: String,

    /// The Google userinfo endpoint
    pub google_userinfo_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// How long a stored token is trusted without re-login
    pub max_session_age: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            google_userinfo_url: DEFAULT_GOOGLE_USERINFO_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            max_session_age: MAX_SESSION_AGE,
        }
    }
}

impl ClientOptions {
    /// Reads overrides from `STOREFRONT_API_URL`, `STOREFRONT_GOOGLE_USERINFO_URL`
    /// and `STOREFRONT_REQUEST_TIMEOUT_SECS` (0 disables the timeout).
    pub fn from_env() -> Result<Self, Error> {
        let mut options = Self::default();

        if let Ok(url) = std::env::var("STOREFRONT_API_URL") {
            options = options.with_api_url(&url);
        }
        if let Ok(url) = std::env::var("STOREFRONT_GOOGLE_USERINFO_URL") {
            options = options.with_google_userinfo_url(&url);
        }
        if let Ok(secs) = std::env::var("STOREFRONT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::config(format!("STOREFRONT_REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            options = options.with_request_timeout(timeout);
        }

        Ok(options)
    }

    /// Set the storefront API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the Google userinfo endpoint
    pub fn with_google_userinfo_url(mut self, value: &str) -> Self {
        self.google_userinfo_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the client-side session freshness ceiling
    pub fn with_max_session_age(mut self, value: Duration) -> Self {
        self.max_session_age = value;
        self
    }

    pub(crate) fn auth_options(&self) -> AuthOptions {
        AuthOptions::default()
            .with_api_url(&self.api_url)
            .with_google_userinfo_url(&self.google_userinfo_url)
            .with_request_timeout(self.request_timeout)
            .with_max_session_age(self.max_session_age)
    }
}
