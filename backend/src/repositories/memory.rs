//! In-process user store
//!
//! Used for local development (`database.backend = "memory"`) and tests.
//! Contents are lost on restart.

use super::{NewUser, StoreError, StoreResult, UserRecord, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User store keeping records in a map keyed by email
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token: user.refresh_token,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.email.clone(), record.clone());

        Ok(record)
    }

    async fn set_refresh_token(
        &self,
        email: &str,
        token: Option<&str>,
    ) -> StoreResult<Option<UserRecord>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(email).map(|record| {
            record.refresh_token = token.map(str::to_string);
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn delete_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.write().await.remove(email))
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let mut users = self.users.write().await;
        let removed = users.len() as u64;
        users.clear();
        Ok(removed)
    }

    async fn list(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
