//! Login session persistence.
//!
//! A successful login yields a bearer token, the username and the wallet
//! balance. The trio is kept in memory as a [`Session`] and mirrored to a
//! small JSON file so the next run starts logged in. [`SessionStore`] owns
//! the file: load at startup, save on login, delete on logout.

use std::io::ErrorKind;
use std::path::PathBuf;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tamarind_core::Username;

/// Errors that can occur reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session file could not be read, written or deleted.
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    /// The session file exists but does not hold a valid session.
    #[error("session file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An authenticated session with the remote store.
#[derive(Debug, Clone)]
pub struct Session {
    username: Username,
    token: SecretString,
    balance: Decimal,
}

impl Session {
    /// Create a session.
    #[must_use]
    pub const fn new(username: Username, token: SecretString, balance: Decimal) -> Self {
        Self {
            username,
            token,
            balance,
        }
    }

    /// The logged-in username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Bearer token for authenticated requests.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Wallet balance reported at login.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }
}

/// On-disk shape of the session file.
///
/// The token leaves its [`SecretString`] wrapper only here, at the
/// serialization boundary.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    username: Username,
    token: String,
    balance: Decimal,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            token: session.token.expose_secret().to_owned(),
            balance: session.balance,
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            username: record.username,
            token: SecretString::from(record.token),
            balance: record.balance,
        }
    }
}

/// Reads and writes the persisted session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the persisted session, if one exists.
    ///
    /// A missing file means nobody is logged in and is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<Session>, SessionError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let record: SessionRecord = serde_json::from_slice(&bytes)?;
        debug!(username = %record.username, "loaded persisted session");
        Ok(Some(record.into()))
    }

    /// Persist `session`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or the file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(&SessionRecord::from(session))?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    /// Delete the persisted session. A missing file is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
