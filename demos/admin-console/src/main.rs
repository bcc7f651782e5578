use std::path::PathBuf;
use std::sync::Arc;

use lms_admin::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ENV_EMAIL: &str = "LMS_ADMIN_EMAIL";
const ENV_PASSWORD: &str = "LMS_ADMIN_PASSWORD";
const ENV_SESSION_FILE: &str = "LMS_ADMIN_SESSION_FILE";
const DEFAULT_SESSION_FILE: &str = "lms-admin-session.json";

// ---------------------------------------------------------------------------
// Terminal navigator
// ---------------------------------------------------------------------------

/// A console has no login screen; tell the operator to sign in again.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to_login(&self, route: &str) {
        eprintln!("session expired, sign in again ({route})");
    }
}

fn session_file(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(ENV_SESSION_FILE)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string())
        .into()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    let path = session_file(|key| std::env::var(key).ok());
    info!(base_url = %config.base_url, session_file = %path.display(), "starting admin console");

    let client = SessionClient::builder()
        .config(config)
        .store(Arc::new(FileStore::new(path)))
        .navigator(Arc::new(ConsoleNavigator))
        .build_default()?;
    client.initialize();

    if !client.is_authenticated() {
        let email = std::env::var(ENV_EMAIL)?;
        let password = std::env::var(ENV_PASSWORD)?;
        let session = client
            .login(&LoginCredentials::new(email, password))
            .await?;
        println!("signed in as {} <{}>", session.user.name, session.user.email);
    }

    if let Some(profile) = client.get_profile().await?.into_data() {
        println!(
            "profile: {} ({}), last login {}",
            profile.user.name,
            profile.user.role,
            profile.user.last_login.as_deref().unwrap_or("never"),
        );
    }

    let response = client.list_users(&UserQuery::default().page(1, 10)).await?;
    match &response.data {
        Some(list) => {
            println!(
                "users (page {} of {}, {} total):",
                list.pagination.current_page, list.pagination.total_pages, list.pagination.total_count,
            );
            for user in &list.users {
                let state = if user.is_blocked { "blocked" } else { "active" };
                println!("  {:<8} {:<30} {state}", user.role.as_str(), user.name);
            }
        }
        None => println!("users: {}", response.failure_message("listing failed")),
    }

    client.logout().await;
    println!("signed out");
    Ok(())
}
