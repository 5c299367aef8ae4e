//! Application state management
//!
//! Shared resources handed to every request handler through axum's state
//! extraction. Built once at startup, read-only afterwards, and cheap to
//! clone (every field is an `Arc` or wraps one).

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::repositories::UserStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// User collection
    pub store: Arc<dyn UserStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Token issuer with pre-computed keys
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state
    ///
    /// Derives the JWT keys from the configured secrets, so call this once.
    pub fn new(store: Arc<dyn UserStore>, config: AppConfig) -> Self {
        let tokens = TokenIssuer::from_config(&config.jwt);

        Self {
            store,
            config: Arc::new(config),
            tokens,
        }
    }

    #[inline]
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
