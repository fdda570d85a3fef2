//! Canonical user profile and the per-provider mappings that build it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::token::{email_local_part, TokenClaims};

/// Identity provider a session was established with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    Email,
    Google,
}

impl LoginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown login type: {}", other)),
        }
    }
}

/// User record returned by `GET /user_email/{email}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Misspelled alias of `last_name` still emitted by some API versions.
    #[serde(default)]
    pub blast_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Google `oauth2/v2/userinfo` record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    /// Every other provider field (`id`, `picture`, `verified_email`, `locale`...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The single profile shape every provider converges to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "loginType")]
    pub login_type: LoginType,
    pub email: String,
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub address: String,
    pub passport_number: String,
    pub password: String,
    /// Set when the profile was rebuilt from token claims alone.
    #[serde(rename = "isTokenData", default, skip_serializing_if = "is_false")]
    pub is_token_data: bool,
    /// Provider-specific fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Treats empty strings like missing values.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn join_names<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// Builds a profile from a first-party API record fetched for `email`.
pub fn from_api_user(record: &ApiUser, email: &str) -> UserProfile {
    let last_name = present(&record.last_name).or(present(&record.blast_name));

    let mut full_name = join_names([
        present(&record.first_name),
        present(&record.middle_name),
        present(&record.last_name),
    ]);
    if full_name.is_empty() {
        full_name = present(&record.email)
            .map(email_local_part)
            .filter(|local| !local.is_empty())
            .unwrap_or_else(|| email_local_part(email))
            .to_string();
    }

    let owned = |value: &Option<String>| present(value).unwrap_or_default().to_string();

    UserProfile {
        login_type: LoginType::Email,
        email: present(&record.email).unwrap_or(email).to_string(),
        name: present(&record.name)
            .unwrap_or_else(|| email_local_part(email))
            .to_string(),
        full_name,
        first_name: owned(&record.first_name),
        middle_name: owned(&record.middle_name),
        last_name: last_name.unwrap_or_default().to_string(),
        date_of_birth: owned(&record.date_of_birth),
        address: owned(&record.address),
        passport_number: owned(&record.passport_number),
        password: owned(&record.password),
        is_token_data: false,
        extra: Map::new(),
    }
}

/// Builds a profile from a Google userinfo record.
pub fn from_google_user(record: &GoogleUserInfo) -> UserProfile {
    let email = present(&record.email).unwrap_or_default();

    let mut extra = record.extra.clone();
    for (key, value) in [
        ("given_name", &record.given_name),
        ("family_name", &record.family_name),
    ] {
        extra.insert(
            key.to_string(),
            value.clone().map(Value::String).unwrap_or(Value::Null),
        );
    }
    extra
        .entry("picture".to_string())
        .or_insert(Value::Null);

    UserProfile {
        login_type: LoginType::Google,
        email: email.to_string(),
        name: present(&record.name).unwrap_or(email).to_string(),
        full_name: present(&record.name)
            .unwrap_or_else(|| email_local_part(email))
            .to_string(),
        first_name: present(&record.given_name).unwrap_or_default().to_string(),
        middle_name: String::new(),
        last_name: present(&record.family_name).unwrap_or_default().to_string(),
        date_of_birth: String::new(),
        address: String::new(),
        passport_number: String::new(),
        password: String::new(),
        is_token_data: false,
        extra,
    }
}

/// Rebuilds a degraded profile from decoded token claims.
pub fn from_claims(claims: &TokenClaims, login_type: LoginType) -> UserProfile {
    let sub = claims.sub().unwrap_or_default();
    let claim = |key: &str| claims.get_str(key).unwrap_or_default().to_string();

    let mut full_name = join_names([
        claims.get_str("first_name"),
        claims.get_str("middle_name"),
        claims.get_str("last_name"),
    ]);
    if full_name.is_empty() {
        full_name = email_local_part(sub).to_string();
    }

    let mut extra = Map::new();
    extra.insert("locale".to_string(), Value::String(claim("locale")));

    UserProfile {
        login_type,
        email: sub.to_string(),
        name: email_local_part(sub).to_string(),
        full_name,
        first_name: claim("first_name"),
        middle_name: claim("middle_name"),
        last_name: claim("last_name"),
        date_of_birth: claim("date_of_birth"),
        address: claim("address"),
        passport_number: claim("passport_number"),
        password: claim("password"),
        is_token_data: true,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_user(value: Value) -> ApiUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_api_user_full_profile() {
        let record = api_user(json!({
            "email": "ivan@example.com",
            "name": "ivan",
            "first_name": "Ivan",
            "middle_name": "Petrovich",
            "last_name": "Sidorov",
            "date_of_birth": "1990-01-01",
            "address": "Moscow",
            "passport_number": "4510 123456",
            "password": "hashed"
        }));

        let profile = from_api_user(&record, "ivan@example.com");
        assert_eq!(profile.login_type, LoginType::Email);
        assert_eq!(profile.full_name, "Ivan Petrovich Sidorov");
        assert_eq!(profile.passport_number, "4510 123456");
        assert!(!profile.is_token_data);
    }

    #[test]
    fn test_api_user_blast_name_fallback() {
        let record = api_user(json!({ "first_name": "Anna", "blast_name": "Ivanov" }));
        let profile = from_api_user(&record, "anna@example.com");

        assert_eq!(profile.last_name, "Ivanov");
        // The alias only fills last_name, not the joined display name.
        assert_eq!(profile.full_name, "Anna");
    }

    #[test]
    fn test_api_user_name_fallbacks() {
        let profile = from_api_user(&api_user(json!({})), "reader@example.com");
        assert_eq!(profile.email, "reader@example.com");
        assert_eq!(profile.name, "reader");
        assert_eq!(profile.full_name, "reader");
        assert_eq!(profile.middle_name, "");

        let record = api_user(json!({ "email": "other@example.com", "first_name": "" }));
        let profile = from_api_user(&record, "reader@example.com");
        assert_eq!(profile.email, "other@example.com");
        assert_eq!(profile.full_name, "other");
        assert_eq!(profile.name, "reader");
    }

    #[test]
    fn test_google_user_passthrough() {
        let record: GoogleUserInfo = serde_json::from_value(json!({
            "id": "1234567890",
            "email": "reader@gmail.com",
            "verified_email": true,
            "name": "Reader One",
            "given_name": "Reader",
            "family_name": "One",
            "picture": "https://lh3.googleusercontent.com/a/photo",
            "locale": "ru"
        }))
        .unwrap();

        let profile = from_google_user(&record);
        assert_eq!(profile.login_type, LoginType::Google);
        assert_eq!(profile.first_name, "Reader");
        assert_eq!(profile.last_name, "One");
        assert_eq!(profile.full_name, "Reader One");
        assert_eq!(profile.date_of_birth, "");
        assert_eq!(profile.extra["id"], json!("1234567890"));
        assert_eq!(profile.extra["verified_email"], json!(true));
        assert_eq!(profile.extra["given_name"], json!("Reader"));

        let serialized = serde_json::to_value(&profile).unwrap();
        assert_eq!(serialized["loginType"], json!("google"));
        assert_eq!(serialized["locale"], json!("ru"));
        assert!(serialized.get("isTokenData").is_none());
    }

    #[test]
    fn test_google_user_without_name() {
        let record: GoogleUserInfo =
            serde_json::from_value(json!({ "email": "reader@gmail.com" })).unwrap();
        let profile = from_google_user(&record);
        assert_eq!(profile.name, "reader@gmail.com");
        assert_eq!(profile.full_name, "reader");
        assert_eq!(profile.extra["picture"], Value::Null);
    }

    #[test]
    fn test_claims_profile_is_flagged() {
        let mut map = Map::new();
        map.insert("sub".to_string(), json!("reader@example.com"));
        map.insert("first_name".to_string(), json!("Reader"));
        map.insert("last_name".to_string(), json!("One"));
        let claims = TokenClaims::new(map);

        let profile = from_claims(&claims, LoginType::Google);
        assert!(profile.is_token_data);
        assert_eq!(profile.login_type, LoginType::Google);
        assert_eq!(profile.email, "reader@example.com");
        assert_eq!(profile.name, "reader");
        assert_eq!(profile.full_name, "Reader One");

        let serialized = serde_json::to_value(&profile).unwrap();
        assert_eq!(serialized["isTokenData"], json!(true));
    }
}
