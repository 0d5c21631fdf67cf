//! Tamarind Core - Shared types library.
//!
//! This crate provides common types used across all Tamarind components:
//! - `storefront` - The client engine (catalog, cart, search, sessions)
//! - `cli` - Command-line driver over the engine
//! - `integration-tests` - End-to-end tests against a mock store API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and plain data for products, cart entries,
//!   derived cart items, and order summaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
