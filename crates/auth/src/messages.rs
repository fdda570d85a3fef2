//! User-facing text for authentication failures.
//!
//! Best-effort localization by ordered substring lookup, not an error code
//! system. The first matching fragment wins.

const TRANSLATIONS: [(&str, &str); 7] = [
    ("invalid token", "Invalid token. Please sign in again."),
    ("token expired", "Your session has expired. Please sign in again."),
    ("401", "Authorization error. Please sign in again."),
    ("Network Error", "Network error. Check your internet connection."),
    ("Failed to fetch", "Could not connect to the server."),
    ("User not found", "User not found."),
    ("Incorrect email or password", "Incorrect email or password."),
];

/// Fragments that mean the stored session is unusable.
const SESSION_ENDING: [&str; 3] = ["expired", "invalid token", "401"];

/// Maps raw error text to a message suitable for the user.
pub fn translate(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    TRANSLATIONS
        .iter()
        .find(|(fragment, _)| lowered.contains(&fragment.to_lowercase()))
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| format!("Authentication error: {}", raw))
}

/// Whether `raw` describes an expired or rejected session.
pub fn ends_session(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    SESSION_ENDING.iter().any(|fragment| lowered.contains(fragment))
}

/// Message shown when the provider redirects back with `error`.
pub fn provider_error(error: &str, description: Option<&str>) -> String {
    format!("Google authorization error: {}", description.unwrap_or(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_known_fragments() {
        assert_eq!(
            translate("Session token expired"),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(
            translate("NETWORK ERROR: connection refused"),
            "Network error. Check your internet connection."
        );
        assert_eq!(
            translate("Incorrect email or password"),
            "Incorrect email or password."
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Matches both "invalid token" and "401"; the earlier entry applies.
        assert_eq!(
            translate("401: invalid token"),
            "Invalid token. Please sign in again."
        );
    }

    #[test]
    fn test_unknown_errors_pass_through() {
        assert_eq!(
            translate("Code already redeemed"),
            "Authentication error: Code already redeemed"
        );
    }

    #[test]
    fn test_ends_session() {
        assert!(ends_session("Session token expired"));
        assert!(ends_session("Request failed with status 401"));
        assert!(ends_session("Invalid Token"));
        assert!(!ends_session("Network Error: timed out"));
        assert!(!ends_session("User not found"));
    }

    #[test]
    fn test_provider_error_prefers_description() {
        assert_eq!(
            provider_error("access_denied", Some("The user denied access")),
            "Google authorization error: The user denied access"
        );
        assert_eq!(
            provider_error("access_denied", None),
            "Google authorization error: access_denied"
        );
    }
}
