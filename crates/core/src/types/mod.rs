//! Core types for Tamarind.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod product;
pub mod username;

pub use cart::{CartEntry, CartItem, OrderSummary};
pub use id::ProductId;
pub use product::Product;
pub use username::{Username, UsernameError};
