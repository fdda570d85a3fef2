use std::time::Duration;

use crate::session::MAX_SESSION_AGE;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Auth client options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Base URL of the storefront API
    pub api_url: String,

    /// Google userinfo endpoint
    pub google_userinfo_url: String,

    /// Timeout applied to every outbound request. `None` waits forever.
    pub request_timeout: Option<Duration>,

    /// Client-side freshness ceiling for a stored access token
    pub max_session_age: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            google_userinfo_url: DEFAULT_GOOGLE_USERINFO_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            max_session_age: MAX_SESSION_AGE,
        }
    }
}

impl AuthOptions {
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.trim_end_matches('/').to_string();
        self
    }

    pub fn with_google_userinfo_url(mut self, value: &str) -> Self {
        self.google_userinfo_url = value.to_string();
        self
    }

    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_max_session_age(mut self, value: Duration) -> Self {
        self.max_session_age = value;
        self
    }

    /// HTTP client honouring `request_timeout`.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}
