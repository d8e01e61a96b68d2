//! The account store seam and its in-memory implementation

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::user::User;

/// Read access to the accounts of the authentication subsystem
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// List every account, in the store's own order
    async fn get_users(&self) -> AuthResult<Vec<User>>;

    /// Look a single account up by id
    async fn get_user(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self
            .get_users()
            .await?
            .into_iter()
            .find(|user| user.id == user_id))
    }
}

/// Accounts held in memory, shared between clones
#[derive(Clone, Default)]
pub struct MemoryAuthStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryAuthStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `users`
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Create a store holding a single owner account, as after onboarding
    pub fn new_onboarded() -> Self {
        Self::with_users(vec![User::owner("Owner")])
    }

    pub async fn add_user(&self, user: User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(AuthError::DuplicateUser(user.id));
        }
        debug!(user_id = %user.id, "Adding user");
        users.push(user);
        Ok(())
    }

    pub async fn remove_user(&self, user_id: &str) -> AuthResult<User> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        debug!(user_id, "Removing user");
        Ok(users.remove(index))
    }

    /// Apply `f` to the user with `user_id`
    pub async fn update_user<F>(&self, user_id: &str, f: F) -> AuthResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        f(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn get_users(&self) -> AuthResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}
