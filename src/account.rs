//! Account endpoints under `/user`

use serde::{Deserialize, Serialize};

use storefront_auth::UserProfile;

/// Placeholder sent when the user is not changing their password.
pub const PASSWORD_PLACEHOLDER: &str = "dummy_password";

/// Fields the user edited. `None` means "not edited".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdates {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub passport_number: Option<String>,
    pub middle_name: Option<String>,
    pub address: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_empty_str(value: &str) -> Option<&str> {
    Some(value).filter(|s| !s.is_empty())
}

/// Query parameters for `PATCH /user`, in the order the API documents them.
///
/// Required fields fall back from the edit to the current profile to "".
/// `middle_name` and `address` may be cleared: an edit is taken as-is even
/// when empty.
pub fn update_params(updates: &UserUpdates, current: &UserProfile) -> Vec<(&'static str, String)> {
    let required = |edited: &Option<String>, existing: &str| {
        non_empty(edited)
            .or(non_empty_str(existing))
            .unwrap_or_default()
            .to_string()
    };
    let optional = |edited: &Option<String>, existing: &str| match edited {
        Some(value) => value.clone(),
        None => existing.to_string(),
    };

    vec![
        ("email", current.email.clone()),
        (
            "password",
            non_empty(&updates.password)
                .unwrap_or(PASSWORD_PLACEHOLDER)
                .to_string(),
        ),
        ("first_name", required(&updates.first_name, &current.first_name)),
        ("last_name", required(&updates.last_name, &current.last_name)),
        ("date_of_birth", required(&updates.date_of_birth, &current.date_of_birth)),
        (
            "passport_number",
            required(&updates.passport_number, &current.passport_number),
        ),
        ("middle_name", optional(&updates.middle_name, &current.middle_name)),
        ("address", optional(&updates.address, &current.address)),
    ]
}
