//! Account commands: register, login, logout.
//!
//! # Usage
//!
//! ```bash
//! tam-cli register -u bobook -p learnbyheart
//! tam-cli login -u bobook -p learnbyheart
//! tam-cli logout
//! ```
//!
//! `login` persists the session to the configured session file, so catalog
//! and cart commands in later invocations pick it up automatically.

use tamarind_storefront::{AuthService, SessionStore, StoreClient, StorefrontConfig};
use tracing::info;

use super::CliError;

/// Create a new account.
///
/// # Errors
///
/// Fails on invalid input or when the server rejects the registration.
pub async fn register(
    config: &StorefrontConfig,
    username: &str,
    password: &str,
    confirm_password: Option<&str>,
) -> Result<(), CliError> {
    let service = auth_service(config)?;
    service
        .register(username, password, confirm_password.unwrap_or(password))
        .await?;
    info!("Registered Successfully");
    Ok(())
}

/// Log in and persist the session for later commands.
///
/// # Errors
///
/// Fails on invalid input or rejected credentials.
pub async fn login(
    config: &StorefrontConfig,
    username: &str,
    password: &str,
) -> Result<(), CliError> {
    let service = auth_service(config)?;
    let session = service.login(username, password).await?;
    info!(
        username = %session.username(),
        balance = %session.balance(),
        "Logged in successfully"
    );
    Ok(())
}

/// Forget the persisted session.
///
/// # Errors
///
/// Fails if the session file cannot be removed.
pub async fn logout(config: &StorefrontConfig) -> Result<(), CliError> {
    let service = auth_service(config)?;
    service.logout().await?;
    Ok(())
}

fn auth_service(config: &StorefrontConfig) -> Result<AuthService, CliError> {
    let api = StoreClient::new(config)?;
    Ok(AuthService::new(
        api,
        SessionStore::new(config.session_file.clone()),
    ))
}
