//! Storefront auth client for Rust
//!
//! This crate resolves who is signed in to the storefront: it reconciles a
//! stored bearer token, an OAuth callback and the absence of a session
//! against the email and Google providers, and yields one canonical
//! [`UserProfile`] whichever path was taken.

pub mod api;
pub mod callback;
pub mod error;
pub mod messages;
pub mod options;
pub mod profile;
pub mod provider;
pub mod session;
pub mod token;

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Client;

pub use api::StorefrontApi;
pub use callback::{CallbackParams, Location, Route};
pub use error::{AuthError, Result};
pub use options::AuthOptions;
pub use profile::{LoginType, UserProfile};
pub use provider::{Authenticator, EmailAuthenticator, GoogleAuthenticator};
pub use session::{FileStore, MemoryStore, SessionStore, TokenResponse};
pub use token::TokenClaims;

/// Lifecycle of one profile-page activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Resolving,
    Resolved,
    Redirected,
    Failed,
}

/// Resolution state owned by the caller, one per page lifetime.
///
/// Holding it outside [`Auth`] makes repeated activation explicit: only the
/// first call to [`Auth::handle_auth`] on a given state does any work.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    phase: Phase,
    processed_codes: HashSet<String>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_processed(&self, code: &str) -> bool {
        self.processed_codes.contains(code)
    }

    /// Allows another activation while remembering codes already exchanged.
    pub fn reactivate(&mut self) {
        self.phase = Phase::Uninitialized;
    }
}

/// Terminal result of a resolution attempt, for the UI layer to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// The state was already initialized; nothing was done.
    Skipped,
    /// Resolution finished. `None` means no user could be produced.
    Resolved(Option<UserProfile>),
    /// The UI should navigate to `to`, showing `message` if present.
    Redirected { to: Route, message: Option<String> },
    /// Resolution failed. `logged_out` is set when the session was cleared.
    Failed {
        message: String,
        logged_out: bool,
        redirect: Option<Route>,
    },
}

impl AuthOutcome {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Resolved(profile) => profile.as_ref(),
            _ => None,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Skipped => Phase::Uninitialized,
            Self::Resolved(_) => Phase::Resolved,
            Self::Redirected { .. } => Phase::Redirected,
            Self::Failed { .. } => Phase::Failed,
        }
    }
}

/// Auth client
pub struct Auth {
    api: StorefrontApi,
    store: Arc<dyn SessionStore>,
    email: EmailAuthenticator,
    google: GoogleAuthenticator,
    options: AuthOptions,
}

impl Auth {
    /// Create a new Auth client
    pub fn new(http_client: Client, options: AuthOptions, store: Arc<dyn SessionStore>) -> Self {
        let api = StorefrontApi::new(&options, http_client);
        Self {
            email: EmailAuthenticator::new(api.clone()),
            google: GoogleAuthenticator::new(api.clone(), store.clone()),
            api,
            store,
            options,
        }
    }

    /// Builds the HTTP client from `options` as well.
    pub fn from_options(options: AuthOptions, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http_client = options.http_client()?;
        Ok(Self::new(http_client, options, store))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn api(&self) -> &StorefrontApi {
        &self.api
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated_within(self.options.max_session_age)
    }

    /// Authenticator for the stored session: Google when tagged so or when
    /// an ID token is present, email otherwise.
    fn stored_authenticator(&self) -> &dyn Authenticator {
        let tagged_google = self.store.login_type() == LoginType::Google;
        if tagged_google || self.store.get_token(session::ID_TOKEN).is_some() {
            &self.google
        } else {
            &self.email
        }
    }

    /// Resolves the current user for one page activation.
    ///
    /// Checked in order: a provider error in the callback, a stored access
    /// token, an unprocessed authorization code, and finally nothing, which
    /// redirects to login. Calls after the first on the same `state` return
    /// [`AuthOutcome::Skipped`].
    pub async fn handle_auth(&self, state: &mut AuthState, location: &mut Location) -> AuthOutcome {
        if state.phase != Phase::Uninitialized {
            log::debug!("Auth already initialized, skipping");
            return AuthOutcome::Skipped;
        }
        state.phase = Phase::Resolving;

        let params = location.params();
        log::debug!(
            "Profile page loaded (code: {}, error: {}, state: {})",
            params.code.is_some(),
            params.error.is_some(),
            params.state.is_some()
        );

        let outcome = self.resolve(state, &params, location).await;
        state.phase = outcome.phase();
        outcome
    }

    async fn resolve(
        &self,
        state: &mut AuthState,
        params: &CallbackParams,
        location: &mut Location,
    ) -> AuthOutcome {
        if let Some(error) = &params.error {
            log::error!("Google OAuth error: {}", error);
            let message = messages::provider_error(error, params.error_description.as_deref());
            location.strip_oauth_params();
            location.replace_path(Route::Profile);
            return AuthOutcome::Redirected {
                to: Route::Profile,
                message: Some(message),
            };
        }

        if let Some(access_token) = self.store.get_token(session::ACCESS_TOKEN) {
            let authenticator = self.stored_authenticator();
            log::debug!("Stored access token found, login type {}", authenticator.login_type());
            let result = authenticator.resolve_from_token(&access_token).await;
            return self.finish(state, result);
        }

        match &params.code {
            Some(code) if !state.processed_codes.contains(code) => {
                log::debug!(
                    "Processing Google OAuth callback with code {}...",
                    code.chars().take(10).collect::<String>()
                );
                state.processed_codes.insert(code.clone());
                let result = self.google.resolve_from_code(code, location).await;
                self.finish(state, result)
            }
            _ => {
                log::debug!("No access token and no OAuth code, redirecting to login");
                AuthOutcome::Redirected {
                    to: Route::Login,
                    message: None,
                }
            }
        }
    }

    /// Converts an authenticator result into an outcome, logging out when
    /// the error says the session is no longer usable.
    fn finish(&self, state: &mut AuthState, result: Result<Option<UserProfile>>) -> AuthOutcome {
        let err = match result {
            Ok(profile) => return AuthOutcome::Resolved(profile),
            Err(AuthError::MissingToken) => {
                return AuthOutcome::Redirected {
                    to: Route::Login,
                    message: None,
                }
            }
            Err(err) => err,
        };

        log::error!("Authentication error: {}", err);
        let raw = err.to_string();
        let message = messages::translate(&raw);

        if err.is_session_expired() || messages::ends_session(&raw) {
            log::debug!("Session expired, logging out");
            self.logout(state);
            return AuthOutcome::Failed {
                message,
                logged_out: true,
                redirect: Some(Route::Login),
            };
        }

        AuthOutcome::Failed {
            message,
            logged_out: false,
            redirect: None,
        }
    }

    /// Re-resolves the stored session regardless of the one-shot guard.
    ///
    /// Only an explicit `google` tag routes to Google here; a bare ID token
    /// does not.
    pub async fn refresh_profile(&self, state: &mut AuthState) -> AuthOutcome {
        let Some(access_token) = self.store.get_token(session::ACCESS_TOKEN) else {
            state.phase = Phase::Redirected;
            return AuthOutcome::Redirected {
                to: Route::Login,
                message: None,
            };
        };

        state.phase = Phase::Resolving;
        let result = match self.store.login_type() {
            LoginType::Google => self.google.resolve_from_token(&access_token).await,
            LoginType::Email => self.email.resolve_from_token(&access_token).await,
        };
        let outcome = self.finish(state, result);
        state.phase = outcome.phase();
        outcome
    }

    /// Clears every session key and forgets processed codes.
    pub fn logout(&self, state: &mut AuthState) {
        self.store.clear_all();
        state.processed_codes.clear();
        log::debug!("User logged out, all tokens cleared");
    }

    /// Signs in with email and password, persisting the issued token.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<String> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Api("Please fill in all fields".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::Api("Please enter a valid email".to_string()));
        }

        let access_token = self.api.login(email, password).await?;

        self.store.save_tokens(&TokenResponse {
            access_token: Some(access_token.clone()),
            ..Default::default()
        });
        self.store.set(session::LOGIN_TYPE, LoginType::Email.as_str());

        match token::decode(&access_token).as_ref().and_then(TokenClaims::sub) {
            Some(sub) => self.store.set(session::USER_EMAIL, sub),
            None => log::warn!("Issued token carries no subject"),
        }

        if remember_me {
            self.store.set(session::REMEMBER_ME, "true");
        }

        log::debug!("Login successful, token saved");
        Ok(access_token)
    }

    /// Consent-screen URL for Google sign-in.
    pub async fn google_auth_url(&self) -> Result<String> {
        self.api.google_auth_url().await
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot inside the domain with text on both sides of it.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.ru"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("reader@.com"));
        assert!(!is_valid_email("read er@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(is_valid_email("a@b.c."));
        assert!(!is_valid_email("a@bc."));
    }

    #[test]
    fn test_skipped_after_first_activation() {
        tokio_test::block_on(async {
            let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
            let auth = Auth::new(Client::new(), AuthOptions::default(), store);
            let mut state = AuthState::new();
            let mut location = Location::parse("http://localhost:5173/profile").unwrap();

            let first = auth.handle_auth(&mut state, &mut location).await;
            assert_eq!(
                first,
                AuthOutcome::Redirected {
                    to: Route::Login,
                    message: None
                }
            );
            assert_eq!(state.phase(), Phase::Redirected);

            let second = auth.handle_auth(&mut state, &mut location).await;
            assert_eq!(second, AuthOutcome::Skipped);
            assert_eq!(state.phase(), Phase::Redirected);
        });
    }
}
