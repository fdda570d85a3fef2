use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use storefront_rust::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let email = env::var("STOREFRONT_EMAIL").expect("STOREFRONT_EMAIL must be set");
    let password = env::var("STOREFRONT_PASSWORD").expect("STOREFRONT_PASSWORD must be set");

    let storefront =
        Storefront::new_with_options(ClientOptions::from_env()?, Arc::new(MemoryStore::new()))?;
    let auth = storefront.auth();

    match auth.google_auth_url().await {
        Ok(url) => println!("Google sign-in URL: {}", url),
        Err(e) => println!("Google sign-in unavailable: {}", e),
    }

    println!("Signing in as {}", email);
    if let Err(e) = auth.login_with_password(&email, &password, true).await {
        println!("Login failed: {}", storefront_auth::messages::translate(&e.to_string()));
        return Ok(());
    }

    let mut state = AuthState::new();
    let outcome = auth.refresh_profile(&mut state).await;
    if let Some(profile) = outcome.profile() {
        println!("Profile: {}", serde_json::to_string_pretty(profile)?);
    }

    let user = storefront.get_user().await?;
    println!("Account record: {}", user);

    let updates = UserUpdates {
        address: env::var("STOREFRONT_NEW_ADDRESS").ok(),
        ..Default::default()
    };
    if updates.address.is_some() {
        if let Some(profile) = outcome.profile() {
            let result = storefront.update_user(&updates, profile).await?;
            println!("Update result: {}", result);
        }
    }

    auth.logout(&mut state);
    println!("Signed out, authenticated = {}", auth.is_authenticated());

    Ok(())
}
