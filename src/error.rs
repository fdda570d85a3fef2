//! Error handling for the storefront client

use std::fmt;
use thiserror::Error;

/// Unified error type for the storefront client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("Network Error: {0}")]
    Http(reqwest::Error),

    /// Authentication errors
    #[error(transparent)]
    Auth(#[from] storefront_auth::AuthError),

    /// Account API errors
    #[error("{0}")]
    Account(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new account error
    pub fn account<T: fmt::Display>(msg: T) -> Self {
        Error::Account(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        storefront_auth::messages::translate(&self.to_string())
    }
}

// Account requests carry profile fields in the query string; keep them out of
// rendered errors.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::account("Invalid response format from server")
        } else {
            Error::Http(err.without_url())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
