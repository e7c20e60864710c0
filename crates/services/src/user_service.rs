use std::sync::Arc;

use quiz_core::model::{NewUser, Page, User, UserFilter, UserId, normalize_user_name};
use storage::repository::{StorageError, UserRepository};

use crate::error::UserServiceError;
use crate::Clock;

/// Registers and looks up quiz takers.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::User` for a blank name.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn create_user(&self, name: impl Into<String>) -> Result<User, UserServiceError> {
        let user = self
            .users
            .insert_user(NewUser::new(name, self.clock.now())?)
            .await?;
        tracing::info!(user = %user.id, "user created");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    /// Users matching `filter`, ordered by id. `page` is one-based.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: u32,
        size: u32,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list_users(filter, Page::new(page, size)).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::User` for a blank name.
    /// Returns `UserServiceError::Storage` with `StorageError::NotFound` if the
    /// user does not exist.
    pub async fn rename_user(&self, id: UserId, name: &str) -> Result<User, UserServiceError> {
        let name = normalize_user_name(name)?;
        if !self.users.rename_user(id, &name).await? {
            return Err(StorageError::NotFound.into());
        }
        tracing::info!(user = %id, "user renamed");
        Ok(self.users.get_user(id).await?.ok_or(StorageError::NotFound)?)
    }

    /// Delete a user and everything they recorded.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn delete_user(&self, id: UserId) -> Result<bool, UserServiceError> {
        Ok(self.users.delete_user(id).await?)
    }
}
