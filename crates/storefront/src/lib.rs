//! Tamarind storefront client engine.
//!
//! This crate is the headless half of a store frontend: it talks to the
//! remote store service, keeps local catalog and cart state, and exposes a
//! message-driven [`engine`] that a display layer (the CLI, a UI, a test
//! harness) drives with commands and observes through events.
//!
//! # Architecture
//!
//! - [`api`] - Typed `reqwest` client for the store's JSON API
//! - [`catalog`] / [`cart`] - Local state stores plus the pure reconcile,
//!   pricing, and mutation-coordination logic
//! - [`search`] - Debounce and stale-response bookkeeping for catalog search
//! - [`session`] - Durable login session (username, bearer token, balance)
//! - [`auth`] - Register/login/logout flows with client-side validation
//! - [`engine`] - The single-task event loop that owns all of the above
//!
//! All remote calls run in spawned tasks that report back to the engine loop
//! as messages; the stores themselves are never shared across tasks.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod search;
pub mod session;

pub use api::{ApiError, StoreClient};
pub use auth::{AuthError, AuthService};
pub use config::{ConfigError, StorefrontConfig};
pub use engine::{
    EngineEvent, EngineSnapshot, Notification, Severity, StorefrontEngine, StorefrontHandle,
};
pub use error::{Result, StorefrontError};
pub use session::{Session, SessionError, SessionStore};
