use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User persistence
///
/// Implementations must treat `email` as unique: a second `insert` with an
/// existing email fails with [`UserError::DuplicateEmail`] even when the
/// caller's `find_by_email` check passed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Get a user by ID
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Persist a new user
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Delete a user by ID, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// All users, oldest first
    async fn list(&self) -> UserResult<Vec<User>>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        // Uniqueness is decided here, under the write lock
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Inserted user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).is_some();

        if removed {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(removed)
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}
