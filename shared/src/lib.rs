//! Storefront Shared Library
//!
//! Request and response types for the accounts API, shared between the
//! backend and any Rust client of it.

pub mod types;
pub mod validation;

// Re-export commonly used items
pub use types::*;
