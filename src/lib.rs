//! Storefront Rust Client Library
//!
//! A Rust client for the storefront API: session resolution across email and
//! Google sign-in, plus the account endpoints that need a signed-in user.

pub mod account;
pub mod config;
pub mod error;
pub mod fetch;

use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use storefront_auth::session::ACCESS_TOKEN;
use storefront_auth::{Auth, MemoryStore, SessionStore, UserProfile};

use crate::account::{update_params, UserUpdates};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use storefront_auth as auth;

/// The main entry point for the storefront client
pub struct Storefront {
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for session resolution and sign-in
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
    store: Arc<dyn SessionStore>,
}

impl Storefront {
    /// Create a client with default options and an in-memory session
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_rust::Storefront;
    ///
    /// let storefront = Storefront::new().unwrap();
    /// assert!(!storefront.auth().is_authenticated());
    /// ```
    pub fn new() -> Result<Self> {
        Self::new_with_options(ClientOptions::default(), Arc::new(MemoryStore::new()))
    }

    /// Create a client with custom options and session store
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use storefront_rust::{auth::FileStore, config::ClientOptions, Storefront};
    ///
    /// let store = Arc::new(FileStore::open("session.json").unwrap());
    /// let options = ClientOptions::default().with_api_url("https://shop.example.com");
    /// let storefront = Storefront::new_with_options(options, store).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions, store: Arc<dyn SessionStore>) -> Result<Self> {
        let auth_options = options.auth_options();
        let http_client = auth_options.http_client()?;

        let auth = Auth::new(http_client.clone(), auth_options, store.clone());

        Ok(Self {
            http_client,
            auth,
            options,
            store,
        })
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Get the session store shared with the auth client
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn access_token(&self) -> Result<String> {
        self.store
            .get_token(ACCESS_TOKEN)
            .ok_or_else(|| Error::account("Token missing"))
    }

    fn user_url(&self) -> String {
        format!("{}/user", self.options.api_url)
    }

    /// Fetch the signed-in user's account record
    pub async fn get_user(&self) -> Result<Value> {
        let token = self.access_token()?;
        Fetch::get(&self.http_client, &self.user_url())
            .bearer_auth(&token)
            .execute::<Value>()
            .await
    }

    /// Send profile edits, merged over `current`
    pub async fn update_user(&self, updates: &UserUpdates, current: &UserProfile) -> Result<Value> {
        let token = self.access_token()?;
        let params = update_params(updates, current);
        log::debug!("Updating account for {}", current.email);

        Fetch::patch(&self.http_client, &self.user_url())
            .bearer_auth(&token)
            .query(params)
            .execute_lenient()
            .await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::account::UserUpdates;
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::Storefront;
    pub use storefront_auth::{
        AuthOutcome, AuthState, FileStore, Location, LoginType, MemoryStore, Route, SessionStore,
        UserProfile,
    };
}
