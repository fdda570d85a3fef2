//! Calls against the storefront API and the Google userinfo endpoint.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AuthError, Result};
use crate::options::AuthOptions;
use crate::profile::{ApiUser, GoogleUserInfo};
use crate::session::TokenResponse;

/// Result of a userinfo lookup that reached the server.
#[derive(Debug, Clone)]
pub enum UserInfoResponse {
    Found(GoogleUserInfo),
    Unauthorized,
    Failed(StatusCode),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUrlResponse {
    uri: String,
}

/// Client for the remote endpoints the auth flow depends on.
#[derive(Debug, Clone)]
pub struct StorefrontApi {
    api_url: String,
    google_userinfo_url: String,
    http_client: Client,
}

impl StorefrontApi {
    pub fn new(options: &AuthOptions, http_client: Client) -> Self {
        Self {
            api_url: options.api_url.trim_end_matches('/').to_string(),
            google_userinfo_url: options.google_userinfo_url.clone(),
            http_client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Looks a user up by email. Any failure is logged and yields `None`.
    pub async fn fetch_user_by_email(&self, email: &str, access_token: Option<&str>) -> Option<ApiUser> {
        let url = format!("{}/user_email/{}", self.api_url, urlencoding::encode(email));

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Error fetching user data from API: {}", err);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("Failed to fetch user data from API: {}", response.status());
            return None;
        }

        match response.json::<ApiUser>().await {
            Ok(user) => Some(user),
            Err(err) => {
                log::warn!("Invalid user data from API: {}", err);
                None
            }
        }
    }

    /// Exchanges a Google authorization code for storefront tokens.
    pub async fn exchange_google_code(&self, code: &str) -> Result<TokenResponse> {
        let url = format!("{}/login/google", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("code", code)])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthExchange(error_detail(&error_text, "Server error")));
        }

        let tokens: TokenResponse = response.json().await?;
        Ok(tokens)
    }

    /// Fetches the Google profile for a bearer token.
    pub async fn google_userinfo(&self, access_token: &str) -> Result<UserInfoResponse> {
        let response = self
            .http_client
            .get(&self.google_userinfo_url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        log::debug!("Google userinfo response status: {}", status);

        if status.is_success() {
            let user: GoogleUserInfo = response.json().await?;
            Ok(UserInfoResponse::Found(user))
        } else if status == StatusCode::UNAUTHORIZED {
            Ok(UserInfoResponse::Unauthorized)
        } else {
            Ok(UserInfoResponse::Failed(status))
        }
    }

    /// Consent-screen URL to send the user to for Google sign-in.
    pub async fn google_auth_url(&self) -> Result<String> {
        let url = format!("{}/google/url", self.api_url);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::Api(
                "Failed to get the authorization URL".to_string(),
            ));
        }

        let body: GoogleUrlResponse = response.json().await?;
        Ok(body.uri)
    }

    /// Email/password login. Returns the issued access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/login", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .query(&[("email", email), ("password", password)])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let data: Value = serde_json::from_str(&body)
            .map_err(|_| AuthError::Api("Invalid response format from server".to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Api(detail_message(&data, "Login failed")));
        }

        let login: LoginResponse = serde_json::from_value(data)?;
        login
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Api("No token received from server".to_string()))
    }
}

/// Pulls `detail` (or `message`) out of an error body.
///
/// `detail` may be a string or a list of validation errors with `msg`.
pub fn detail_message(data: &Value, fallback: &str) -> String {
    match data.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
        Some(Value::Array(items)) if !items.is_empty() => {
            return items
                .iter()
                .map(|item| match item.get("msg") {
                    Some(Value::String(msg)) => msg.clone(),
                    _ => match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                })
                .collect::<Vec<_>>()
                .join(", ");
        }
        _ => {}
    }

    match data.get("message") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        _ => fallback.to_string(),
    }
}

/// Error text for a failed exchange: JSON `detail`, else the raw body.
fn error_detail(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            _ => fallback.to_string(),
        },
        Ok(_) | Err(_) if !body.trim().is_empty() => body.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_message_variants() {
        assert_eq!(
            detail_message(&json!({ "detail": "Incorrect email or password" }), "x"),
            "Incorrect email or password"
        );
        assert_eq!(
            detail_message(
                &json!({ "detail": [{ "msg": "field required" }, { "msg": "value is not a valid email" }] }),
                "x"
            ),
            "field required, value is not a valid email"
        );
        assert_eq!(detail_message(&json!({ "message": "Locked" }), "x"), "Locked");
        assert_eq!(detail_message(&json!({}), "Login failed"), "Login failed");
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"Invalid code"}"#, "Server error"), "Invalid code");
        assert_eq!(error_detail(r#"{"other":1}"#, "Server error"), "Server error");
        assert_eq!(error_detail("Bad Gateway", "Server error"), "Bad Gateway");
        assert_eq!(error_detail("", "Server error"), "Server error");
    }
}
