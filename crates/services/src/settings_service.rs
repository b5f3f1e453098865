use std::sync::Arc;

use names_core::model::{Settings, SettingsPatch, UserId};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

/// Per-user settings with defaults applied on first access.
#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<dyn SettingsRepository>,
    defaults: Settings,
}

impl SettingsService {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsRepository>) -> Self {
        Self::with_defaults(settings, Settings::default())
    }

    #[must_use]
    pub fn with_defaults(settings: Arc<dyn SettingsRepository>, defaults: Settings) -> Self {
        Self { settings, defaults }
    }

    #[must_use]
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on repository failures.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Settings, SettingsServiceError> {
        Ok(self.settings.get_or_create(user_id, &self.defaults).await?)
    }

    /// Apply only the fields present in `patch`. An empty patch just reads.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on repository failures.
    pub async fn update(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Settings, SettingsServiceError> {
        if patch.is_empty() {
            return self.get_or_create(user_id).await;
        }
        Ok(self
            .settings
            .update(user_id, &patch, &self.defaults)
            .await?)
    }
}
