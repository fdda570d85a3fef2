use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use storefront_rust::auth::profile::{from_api_user, ApiUser};
use storefront_rust::auth::session::ACCESS_TOKEN;
use storefront_rust::prelude::*;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "reader@example.com";

fn mint(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"storefront-test-secret"),
    )
    .unwrap()
}

fn setup(server: &MockServer) -> (Storefront, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let options = ClientOptions::default()
        .with_api_url(&server.uri())
        .with_google_userinfo_url(&format!("{}/oauth2/v2/userinfo", server.uri()));
    let storefront = Storefront::new_with_options(options, store.clone()).unwrap();
    (storefront, store)
}

fn current_profile() -> UserProfile {
    from_api_user(
        &ApiUser {
            email: Some(EMAIL.to_string()),
            first_name: Some("Anna".to_string()),
            last_name: Some("Petrova".to_string()),
            date_of_birth: Some("1995-04-12".to_string()),
            passport_number: Some("9204 556677".to_string()),
            address: Some("Kazan".to_string()),
            ..Default::default()
        },
        EMAIL,
    )
}

#[tokio::test]
async fn test_get_user_sends_bearer_token() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);
    store.set(ACCESS_TOKEN, "stored-token");

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": EMAIL })))
        .expect(1)
        .mount(&server)
        .await;

    let user = storefront.get_user().await.unwrap();
    assert_eq!(user["email"], EMAIL);
}

#[tokio::test]
async fn test_get_user_rejects_malformed_body() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);
    store.set(ACCESS_TOKEN, "stored-token");

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = storefront.get_user().await.unwrap_err();
    assert!(
        matches!(err, Error::Account(ref msg) if msg == "Invalid response format from server")
    );
}

#[tokio::test]
async fn test_account_calls_require_token() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);

    let result = storefront.get_user().await;
    assert!(matches!(result, Err(Error::Account(ref msg)) if msg == "Token missing"));

    // An empty stored token is no token.
    store.set(ACCESS_TOKEN, "");
    assert!(storefront.get_user().await.is_err());

    let result = storefront
        .update_user(&UserUpdates::default(), &current_profile())
        .await;
    assert!(result.is_err());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_update_user_merges_edits_into_query() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);
    store.set(ACCESS_TOKEN, "stored-token");

    Mock::given(method("PATCH"))
        .and(path("/user"))
        .and(header("Authorization", "Bearer stored-token"))
        .and(query_param("email", EMAIL))
        .and(query_param("password", "dummy_password"))
        .and(query_param("first_name", "Anna"))
        .and(query_param("last_name", "Ivanova"))
        .and(query_param("date_of_birth", "1995-04-12"))
        .and(query_param("passport_number", "9204 556677"))
        .and(query_param("middle_name", ""))
        .and(query_param("address", "Moscow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let updates = UserUpdates {
        last_name: Some("Ivanova".to_string()),
        address: Some("Moscow".to_string()),
        ..Default::default()
    };

    // Empty success bodies come back as an empty object.
    let body = storefront
        .update_user(&updates, &current_profile())
        .await
        .unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_update_user_surfaces_server_message() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);
    store.set(ACCESS_TOKEN, "stored-token");

    Mock::given(method("PATCH"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "detail": "Invalid date of birth" })),
        )
        .mount(&server)
        .await;

    let err = storefront
        .update_user(&UserUpdates::default(), &current_profile())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid date of birth");
    assert_eq!(
        err.user_message(),
        "Authentication error: Invalid date of birth"
    );
}

#[tokio::test]
async fn test_facade_shares_session_with_auth() {
    let server = MockServer::start().await;
    let (storefront, store) = setup(&server);
    let token = mint(json!({
        "sub": EMAIL,
        "exp": now_secs() + 3600,
    }));
    store.set(ACCESS_TOKEN, &token);

    Mock::given(method("GET"))
        .and(path_regex("^/user_email/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": EMAIL,
            "first_name": "Anna",
            "last_name": "Petrova"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = AuthState::new();
    let mut location = Location::parse("http://localhost:5173/profile").unwrap();
    let outcome = storefront.auth().handle_auth(&mut state, &mut location).await;

    let profile = outcome.profile().unwrap();
    assert_eq!(profile.email, EMAIL);
    assert_eq!(profile.full_name, "Anna Petrova");
    assert_eq!(profile.login_type, LoginType::Email);
    assert!(store.get(ACCESS_TOKEN).is_some());
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
