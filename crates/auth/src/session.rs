//! Persisted session state.
//!
//! The key names below are the storage contract: any replacement backend must
//! read and write exactly these keys.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{AuthError, Result};
use crate::token;
use crate::LoginType;

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const ID_TOKEN: &str = "id_token";
pub const TOKEN_TIMESTAMP: &str = "token_timestamp";
pub const REMEMBER_ME: &str = "remember_me";
pub const LOGIN_TYPE: &str = "login_type";
pub const USER_EMAIL: &str = "user_email";

/// Keys removed on logout. `user_email` deliberately survives.
pub const SESSION_KEYS: [&str; 6] = [
    ACCESS_TOKEN,
    REFRESH_TOKEN,
    ID_TOKEN,
    TOKEN_TIMESTAMP,
    REMEMBER_ME,
    LOGIN_TYPE,
];

/// Client-side freshness ceiling for a stored access token.
pub const MAX_SESSION_AGE: Duration = Duration::from_secs(23 * 60 * 60);

/// Token material returned by a login or code exchange.
///
/// Every field is optional; missing ones are simply not written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Key-value persistence for session state.
///
/// Implementors only provide `get`/`set`/`remove`; the session lifecycle is
/// built on top of them.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// Stored credential under `key`. An empty value counts as absent.
    fn get_token(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Removes every session key.
    fn clear_all(&self) {
        for key in SESSION_KEYS {
            self.remove(key);
        }
        log::debug!("Session cleared");
    }

    /// Persists whatever token material is present in `tokens`.
    fn save_tokens(&self, tokens: &TokenResponse) {
        if let Some(access_token) = &tokens.access_token {
            self.set(ACCESS_TOKEN, access_token);
            self.set(
                TOKEN_TIMESTAMP,
                &chrono::Utc::now().timestamp_millis().to_string(),
            );
            log::debug!("Access token saved");
        }
        if let Some(refresh_token) = &tokens.refresh_token {
            self.set(REFRESH_TOKEN, refresh_token);
        }
        if let Some(id_token) = &tokens.id_token {
            self.set(ID_TOKEN, id_token);
        }
    }

    fn is_authenticated(&self) -> bool {
        self.is_authenticated_within(MAX_SESSION_AGE)
    }

    /// True when an access token is stored and, if its save time is known,
    /// it is no older than `max_age`.
    fn is_authenticated_within(&self, max_age: Duration) -> bool {
        if self.get_token(ACCESS_TOKEN).is_none() {
            return false;
        }

        let Some(timestamp) = self.get(TOKEN_TIMESTAMP) else {
            return true;
        };

        // An unparseable timestamp gives no age information.
        let Ok(saved_at) = timestamp.trim().parse::<i64>() else {
            return true;
        };

        let age = chrono::Utc::now().timestamp_millis() - saved_at;
        if age > max_age.as_millis() as i64 {
            log::debug!("Stored token is too old, treating session as expired");
            return false;
        }
        true
    }

    /// Stored provider tag, defaulting to email.
    fn login_type(&self) -> LoginType {
        self.get(LOGIN_TYPE)
            .and_then(|value| value.parse().ok())
            .unwrap_or(LoginType::Email)
    }

    /// `sub` claim of the stored access token.
    fn user_email_from_token(&self) -> Option<String> {
        let access_token = self.get_token(ACCESS_TOKEN)?;
        token::decode(&access_token)?.sub().map(str::to_string)
    }
}

/// In-memory store, lost with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let read_guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        read_guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut write_guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        write_guard.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut write_guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        write_guard.remove(key);
    }
}

/// Store backed by a JSON object on disk, written through on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text).map_err(AuthError::from)
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) {
        let mut write_guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        apply(&mut write_guard);
        if let Err(err) = self.persist(&write_guard) {
            log::error!("Failed to persist session to {}: {}", self.path.display(), err);
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let read_guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        read_guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }
}
