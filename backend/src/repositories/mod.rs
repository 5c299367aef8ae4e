//! User store
//!
//! The account service talks to the user collection only through
//! [`UserStore`]. Records are keyed by email; every mutation touches exactly
//! one record, so the only concurrency guarantee relied upon is the
//! backend's single-record atomicity (last writer wins).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use storefront_shared::UserProfile;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::PgUserStore;

/// Stored user record
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// The single active refresh token; `None` means signed out
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view, leaving out the password hash and refresh token
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("signed_in", &self.is_signed_in())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating a user
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations on the user collection
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Insert a new user; fails with [`StoreError::DuplicateEmail`] if taken
    async fn insert(&self, user: NewUser) -> StoreResult<UserRecord>;

    /// Overwrite (or clear, with `None`) the stored refresh token.
    /// Returns the updated record, or `None` if no such user exists.
    async fn set_refresh_token(
        &self,
        email: &str,
        token: Option<&str>,
    ) -> StoreResult<Option<UserRecord>>;

    /// Remove a user, returning the removed record
    async fn delete_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Remove every user, returning how many were removed
    async fn delete_all(&self) -> StoreResult<u64>;

    async fn list(&self) -> StoreResult<Vec<UserRecord>>;

    async fn health_check(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            refresh_token: Some("token".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_copies_public_fields() {
        let record = record();
        let profile = record.to_profile();
        assert_eq!(profile.id, record.id);
        assert_eq!(profile.name, "Ann");
        assert_eq!(profile.email, "ann@x.com");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let rendered = format!("{:?}", record());
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("\"token\""));
        assert!(rendered.contains("signed_in: true"));
    }
}
