//! Account registration and login.
//!
//! Credentials are validated locally before any request leaves the client;
//! a validation failure therefore costs no network round trip. Server
//! rejections that carry a message (a taken username, a wrong password)
//! surface that message verbatim.

use reqwest::StatusCode;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument};

use tamarind_core::{Username, UsernameError};

use crate::api::{ApiError, StoreClient};
use crate::session::{Session, SessionError, SessionStore};

/// Minimum username length for new accounts.
const MIN_USERNAME_LENGTH: usize = 6;

/// Minimum password length for new accounts.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during authentication operations.
///
/// The validation variants double as user-facing copy; their `Display`
/// output is shown as-is.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username field left empty.
    #[error("Username is a required field")]
    MissingUsername,

    /// Username shorter than [`MIN_USERNAME_LENGTH`].
    #[error("Username must be at least 6 characters")]
    UsernameTooShort,

    /// Password field left empty.
    #[error("Password is a required field")]
    MissingPassword,

    /// Password shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    /// Confirmation does not match the password.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The server rejected the request and said why.
    #[error("{0}")]
    Rejected(String),

    /// The request failed without a server-provided reason.
    #[error("authentication request failed: {0}")]
    Api(ApiError),

    /// The session could not be persisted or cleared.
    #[error("session persistence failed: {0}")]
    Session(#[from] SessionError),

    /// The login response carried a username this client cannot represent.
    #[error("server returned an invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),
}

impl AuthError {
    /// Whether this is a local validation failure (no request was sent).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingUsername
                | Self::UsernameTooShort
                | Self::MissingPassword
                | Self::PasswordTooShort
                | Self::PasswordMismatch
        )
    }
}

/// Registration, login, and logout against the remote store.
#[derive(Clone)]
pub struct AuthService {
    api: StoreClient,
    sessions: SessionStore,
}

impl AuthService {
    /// Create an authentication service.
    #[must_use]
    pub const fn new(api: StoreClient, sessions: SessionStore) -> Self {
        Self { api, sessions }
    }

    /// Register a new account.
    ///
    /// Registration does not log the new account in.
    ///
    /// # Errors
    ///
    /// Returns a validation variant if the fields fail the local rules,
    /// `AuthError::Rejected` if the server refused (for example a taken
    /// username), or `AuthError::Api` on transport failures.
    #[instrument(skip(self, password, confirm_password), fields(username = %username))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        validate_registration(username, password, confirm_password)?;

        self.api
            .register(username, password)
            .await
            .map_err(rejection_or_api)?;

        info!("account registered");
        Ok(())
    }

    /// Log in and persist the resulting session.
    ///
    /// # Errors
    ///
    /// Returns a validation variant if a field is empty, `AuthError::Rejected`
    /// if the credentials were refused, `AuthError::Api` on transport
    /// failures, or `AuthError::Session` if the session cannot be persisted.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        validate_login(username, password)?;

        let data = self
            .api
            .login(username, password)
            .await
            .map_err(rejection_or_api)?;

        let username = Username::parse(&data.username)?;
        let session = Session::new(username, SecretString::from(data.token), data.balance);
        self.sessions.save(&session).await?;

        info!("logged in");
        Ok(session)
    }

    /// Forget the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session file cannot be deleted.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.sessions.clear().await?;
        info!("logged out");
        Ok(())
    }
}

/// Map an API failure to the rejection message when the server gave one.
///
/// Only `400 Bad Request` responses carry an intentional user-facing
/// message; anything else stays an opaque API error.
fn rejection_or_api(err: ApiError) -> AuthError {
    if err.status() == Some(StatusCode::BAD_REQUEST)
        && let Some(message) = err.server_message()
    {
        return AuthError::Rejected(message.to_owned());
    }
    AuthError::Api(err)
}

fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::MissingUsername);
    }
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(AuthError::UsernameTooShort);
    }
    if password.is_empty() {
        return Err(AuthError::MissingPassword);
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort);
    }
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Login only checks that the fields are present; the server judges the
/// credentials themselves.
fn validate_login(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::MissingUsername);
    }
    if password.is_empty() {
        return Err(AuthError::MissingPassword);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
