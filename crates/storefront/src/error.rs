//! Unified error handling.
//!
//! Provides a unified `StorefrontError` type over the per-module errors.
//! Entry points (engine spawn, CLI commands) return `Result<T, StorefrontError>`;
//! inside the engine the more specific module errors are used directly.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::session::SessionError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Store API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The engine task is no longer running.
    #[error("Engine stopped")]
    EngineStopped,
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
