use thiserror::Error;

/// Errors produced while acquiring or resolving a session.
///
/// The rendered messages are what [`crate::messages::translate`] matches on,
/// so each variant keeps the fragment its translation is keyed by.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to decode token: {0}")]
    Decode(String),

    #[error("Email ({0} claim) not found in token")]
    MissingClaim(&'static str),

    #[error("Session token expired")]
    SessionExpired,

    #[error("Could not load user data")]
    ProfileFetch,

    #[error("{0}")]
    OAuthExchange(String),

    #[error("Network Error: {0}")]
    Network(reqwest::Error),

    #[error("{0}")]
    Api(String),

    #[error("No access token available")]
    MissingToken,

    #[error("Unsupported flow: {0}")]
    Unsupported(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// Whether this error means the stored session can no longer be used.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

// Rendered text must not carry request URLs: they hold OAuth codes and ports
// that the translation table would otherwise match on.
impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Api("Invalid response format from server".to_string())
        } else {
            Self::Network(err.without_url())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
