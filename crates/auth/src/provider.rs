//! Per-provider strategies for turning credentials into a profile.

use async_trait::async_trait;
use std::sync::Arc;

use crate::api::{StorefrontApi, UserInfoResponse};
use crate::callback::Location;
use crate::error::{AuthError, Result};
use crate::profile::{self, LoginType, UserProfile};
use crate::session::{SessionStore, LOGIN_TYPE};
use crate::token;

/// Obtains a profile from a bearer token or an OAuth authorization code.
///
/// `Ok(None)` means resolution finished without a user; it is not an error.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn login_type(&self) -> LoginType;

    async fn resolve_from_token(&self, access_token: &str) -> Result<Option<UserProfile>>;

    async fn resolve_from_code(
        &self,
        code: &str,
        location: &mut Location,
    ) -> Result<Option<UserProfile>>;
}

/// First-party email/password sessions.
pub struct EmailAuthenticator {
    api: StorefrontApi,
}

impl EmailAuthenticator {
    pub fn new(api: StorefrontApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Authenticator for EmailAuthenticator {
    fn login_type(&self) -> LoginType {
        LoginType::Email
    }

    async fn resolve_from_token(&self, access_token: &str) -> Result<Option<UserProfile>> {
        log::debug!("Resolving email login profile");

        if access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = token::decode(access_token)
            .ok_or_else(|| AuthError::Decode("malformed access token".to_string()))?;

        let email = claims.sub().ok_or(AuthError::MissingClaim("sub"))?;

        if !claims.is_valid() {
            log::debug!("Access token expired");
            return Err(AuthError::SessionExpired);
        }

        let record = match self.api.fetch_user_by_email(email, Some(access_token)).await {
            Some(record) => record,
            None => {
                log::debug!("Retrying user lookup without credentials");
                match self.api.fetch_user_by_email(email, None).await {
                    Some(record) => record,
                    None => {
                        log::warn!("Could not load user data for {}", email);
                        return Err(AuthError::ProfileFetch);
                    }
                }
            }
        };

        Ok(Some(profile::from_api_user(&record, email)))
    }

    async fn resolve_from_code(
        &self,
        _code: &str,
        _location: &mut Location,
    ) -> Result<Option<UserProfile>> {
        Err(AuthError::Unsupported(
            "email sessions are not established with an authorization code".to_string(),
        ))
    }
}

/// Google OAuth sessions brokered by the storefront API.
pub struct GoogleAuthenticator {
    api: StorefrontApi,
    store: Arc<dyn SessionStore>,
}

impl GoogleAuthenticator {
    pub fn new(api: StorefrontApi, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    /// Degraded profile from the token's own claims, if they are still usable.
    fn profile_from_claims(&self, access_token: &str) -> Option<UserProfile> {
        let claims = token::decode_valid(access_token)?;
        claims.sub()?;
        log::debug!("Using token claims as profile data");
        Some(profile::from_claims(&claims, LoginType::Google))
    }
}

#[async_trait]
impl Authenticator for GoogleAuthenticator {
    fn login_type(&self) -> LoginType {
        LoginType::Google
    }

    async fn resolve_from_token(&self, access_token: &str) -> Result<Option<UserProfile>> {
        log::debug!("Fetching Google profile");

        if access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        match self.api.google_userinfo(access_token).await {
            Ok(UserInfoResponse::Found(user)) => Ok(Some(profile::from_google_user(&user))),
            Ok(UserInfoResponse::Unauthorized) => {
                log::warn!("Google token expired or invalid (401)");
                Ok(self.profile_from_claims(access_token))
            }
            Ok(UserInfoResponse::Failed(status)) => {
                log::warn!("Failed to fetch Google profile: {}", status);
                Ok(self.profile_from_claims(access_token))
            }
            Err(err) => {
                log::warn!("Error fetching Google profile: {}", err);
                Ok(self.profile_from_claims(access_token))
            }
        }
    }

    async fn resolve_from_code(
        &self,
        code: &str,
        location: &mut Location,
    ) -> Result<Option<UserProfile>> {
        let tokens = self.api.exchange_google_code(code).await?;

        self.store.save_tokens(&tokens);
        self.store.set(LOGIN_TYPE, LoginType::Google.as_str());
        location.strip_oauth_params();

        let access_token = tokens.access_token.unwrap_or_default();
        self.resolve_from_token(&access_token).await
    }
}
