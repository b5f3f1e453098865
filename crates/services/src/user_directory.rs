use std::sync::Arc;

use names_core::Clock;
use names_core::model::{User, UserId, UserProfile};
use storage::repository::UserRepository;

use crate::error::UserDirectoryError;

/// Facade over user identity records.
#[derive(Clone)]
pub struct UserDirectory {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Idempotent upsert: refreshes profile fields and reactivates the user.
    /// Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns `UserDirectoryError::Storage` on repository failures.
    pub async fn ensure_user(
        &self,
        user_id: UserId,
        profile: UserProfile,
    ) -> Result<User, UserDirectoryError> {
        let candidate = User::new(user_id, profile, self.clock.now());
        self.users.ensure_user(&candidate).await?;
        let stored = self.users.get_user(user_id).await?;
        Ok(stored.unwrap_or(candidate))
    }

    /// # Errors
    ///
    /// Returns `UserDirectoryError::Storage` on repository failures.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, UserDirectoryError> {
        Ok(self.users.get_user(user_id).await?)
    }

    /// Deactivated users receive no reminders.
    ///
    /// # Errors
    ///
    /// Returns `UserDirectoryError::Storage` (wrapping `NotFound`) for unknown users.
    pub async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), UserDirectoryError> {
        Ok(self.users.set_active(user_id, active).await?)
    }
}
