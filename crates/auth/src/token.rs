//! Unverified decoding of compact signed tokens.
//!
//! Claims are read for display purposes only. Signatures are never checked
//! here, so nothing decoded by this module may be used for access control.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::{Map, Value};

/// URL-safe alphabet, accepting payloads with or without `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded payload of a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    inner: Map<String, Value>,
}

impl TokenClaims {
    pub fn new(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    /// Subject claim, used as the account email.
    pub fn sub(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Expiry in epoch seconds. `None` when absent or null.
    pub fn exp(&self) -> Option<&Value> {
        self.inner.get("exp").filter(|v| !v.is_null())
    }

    /// Returns a claim as a string slice, treating empty strings as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.inner
    }

    /// Whether the token is still usable at `now_secs`.
    ///
    /// A missing `exp` never expires. A non-numeric `exp` cannot be
    /// checked and is treated as expired. No clock-skew leeway is applied.
    pub fn is_valid_at(&self, now_secs: i64) -> bool {
        match self.exp() {
            None => true,
            Some(exp) => match exp.as_f64() {
                Some(exp) => exp > now_secs as f64,
                None => false,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now().timestamp())
    }
}

/// Decodes the payload segment of `token` without verifying its signature.
///
/// Returns `None` for anything that is not `header.payload[.signature]` with
/// a base64url, UTF-8, JSON-object payload. The cause is logged.
pub fn decode(token: &str) -> Option<TokenClaims> {
    let Some(payload) = token.split('.').nth(1) else {
        log::warn!("Error decoding token: missing payload segment");
        return None;
    };

    let bytes = match PAYLOAD_ENGINE.decode(payload) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Error decoding token: {}", err);
            return None;
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("Error decoding token: {}", err);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Some(TokenClaims::new(map)),
        Ok(_) => {
            log::warn!("Error decoding token: payload is not a JSON object");
            None
        }
        Err(err) => {
            log::warn!("Error decoding token: {}", err);
            None
        }
    }
}

/// Decodes and validates in one step, the check every fallback path needs.
pub fn decode_valid(token: &str) -> Option<TokenClaims> {
    decode(token).filter(TokenClaims::is_valid)
}

/// Local part of an email address (everything before the first `@`).
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}
