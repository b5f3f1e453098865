use async_trait::async_trait;
use chrono::{DateTime, Utc};
use names_core::model::{
    NameNumber, NameProgress, ReminderHour, Settings, SettingsPatch, User, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-user, per-name learning state.
///
/// Every mutating call is atomic for its (user, number) pair: concurrent
/// answers for the same name never lose an increment.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Create the row on first exposure, count the attempt, bump the correct
    /// counter when `was_correct`, stamp the review time and promote to learned
    /// at the mastery threshold. Returns the row as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn record_answer(
        &self,
        user_id: UserId,
        number: NameNumber,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError>;

    /// Force the learned flag, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn mark_learned(
        &self,
        user_id: UserId,
        number: NameNumber,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError>;

    /// Fetch one row; `Ok(None)` when the user never touched this name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_progress(
        &self,
        user_id: UserId,
        number: NameNumber,
    ) -> Result<Option<NameProgress>, StorageError>;

    /// All rows for a user ordered by name number.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_progress(&self, user_id: UserId) -> Result<Vec<NameProgress>, StorageError>;
}

/// Per-user settings with get-or-create semantics.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Return the stored settings, inserting `defaults` first if the user has
    /// none. At most one row ever exists per user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_or_create(
        &self,
        user_id: UserId,
        defaults: &Settings,
    ) -> Result<Settings, StorageError>;

    /// Apply only the `Some` fields of `patch`, creating the row from
    /// `defaults` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn update(
        &self,
        user_id: UserId,
        patch: &SettingsPatch,
        defaults: &Settings,
    ) -> Result<Settings, StorageError>;

    /// Active users with reminders enabled at the given hour.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_reminder_targets(&self, hour: ReminderHour)
    -> Result<Vec<UserId>, StorageError>;
}

/// Identity records owned by the user directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user or refresh its profile fields. `created_at` of an
    /// existing row is preserved and the user is marked active again.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn ensure_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown user.
    async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Each read-modify-write happens under one lock, which gives the same
/// per-row atomicity the SQL backend gets from single-statement upserts.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<(UserId, NameNumber), NameProgress>>>,
    settings: Arc<Mutex<HashMap<UserId, Settings>>>,
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_answer(
        &self,
        user_id: UserId,
        number: NameNumber,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError> {
        let mut guard = self.progress.lock().map_err(lock_err)?;
        let entry = guard
            .entry((user_id, number))
            .or_insert_with(|| NameProgress::new(user_id, number));
        entry.record_answer(was_correct, at);
        Ok(entry.clone())
    }

    async fn mark_learned(
        &self,
        user_id: UserId,
        number: NameNumber,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError> {
        let mut guard = self.progress.lock().map_err(lock_err)?;
        let entry = guard
            .entry((user_id, number))
            .or_insert_with(|| NameProgress::new(user_id, number));
        entry.mark_learned(at);
        Ok(entry.clone())
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        number: NameNumber,
    ) -> Result<Option<NameProgress>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        Ok(guard.get(&(user_id, number)).cloned())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<NameProgress>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        let mut rows: Vec<NameProgress> = guard
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(NameProgress::number);
        Ok(rows)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_or_create(
        &self,
        user_id: UserId,
        defaults: &Settings,
    ) -> Result<Settings, StorageError> {
        let mut guard = self.settings.lock().map_err(lock_err)?;
        Ok(guard
            .entry(user_id)
            .or_insert_with(|| defaults.clone())
            .clone())
    }

    async fn update(
        &self,
        user_id: UserId,
        patch: &SettingsPatch,
        defaults: &Settings,
    ) -> Result<Settings, StorageError> {
        let mut guard = self.settings.lock().map_err(lock_err)?;
        let entry = guard.entry(user_id).or_insert_with(|| defaults.clone());
        *entry = entry.apply(patch);
        Ok(entry.clone())
    }

    async fn list_reminder_targets(
        &self,
        hour: ReminderHour,
    ) -> Result<Vec<UserId>, StorageError> {
        let settings = self.settings.lock().map_err(lock_err)?;
        let users = self.users.lock().map_err(lock_err)?;
        let mut targets: Vec<UserId> = settings
            .iter()
            .filter(|(_, s)| s.reminders_enabled() && s.reminder_hour() == hour)
            .filter(|(id, _)| users.get(*id).is_some_and(User::is_active))
            .map(|(id, _)| *id)
            .collect();
        targets.sort();
        Ok(targets)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn ensure_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(lock_err)?;
        let created_at = guard
            .get(&user.id())
            .map_or_else(|| user.created_at(), User::created_at);
        let refreshed = User::from_persisted(user.id(), profile_of(user), true, created_at);
        guard.insert(user.id(), refreshed);
        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(lock_err)?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(lock_err)?;
        let user = guard.get(&user_id).ok_or(StorageError::NotFound)?;
        let updated =
            User::from_persisted(user.id(), profile_of(user), active, user.created_at());
        guard.insert(user_id, updated);
        Ok(())
    }
}

pub(crate) fn profile_of(user: &User) -> names_core::model::UserProfile {
    names_core::model::UserProfile {
        first_name: user.first_name().map(str::to_owned),
        last_name: user.last_name().map(str::to_owned),
        username: user.username().map(str::to_owned),
        language_code: user.language_code().map(str::to_owned),
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Self {
            progress,
            settings,
            users,
        }
    }
}
