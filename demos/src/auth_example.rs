use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use storefront_rust::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();
    pretty_env_logger::init();

    let options = ClientOptions::from_env()?;
    let session_file =
        env::var("STOREFRONT_SESSION_FILE").unwrap_or_else(|_| "session.json".to_string());
    let store = Arc::new(FileStore::open(&session_file)?);

    let storefront = Storefront::new_with_options(options, store)?;

    // Pass the URL the browser landed on, e.g. the Google callback with ?code=...
    let url = env::args()
        .nth(1)
        .or_else(|| env::var("STOREFRONT_CALLBACK_URL").ok())
        .unwrap_or_else(|| "http://localhost:5173/profile".to_string());
    let mut location = Location::parse(&url)?;

    println!("Resolving session for {}", location.as_str());

    let mut state = AuthState::new();
    let outcome = storefront.auth().handle_auth(&mut state, &mut location).await;

    match &outcome {
        AuthOutcome::Resolved(Some(profile)) => {
            println!("Signed in as {} ({})", profile.full_name, profile.login_type);
            println!("{}", serde_json::to_string_pretty(profile)?);
        }
        AuthOutcome::Resolved(None) => println!("No user could be resolved"),
        AuthOutcome::Redirected { to, message } => {
            println!("Redirect to {}", to.path());
            if let Some(message) = message {
                println!("Message: {}", message);
            }
        }
        AuthOutcome::Failed {
            message,
            logged_out,
            redirect,
        } => {
            println!("Failed: {}", message);
            if *logged_out {
                println!("Session cleared");
            }
            if let Some(to) = redirect {
                println!("Redirect to {}", to.path());
            }
        }
        AuthOutcome::Skipped => println!("Already initialized"),
    }

    println!("Address bar now shows {}", location.as_str());

    Ok(())
}
