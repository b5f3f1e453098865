use std::path::Path;
use std::sync::Arc;

use names_core::model::{ChatId, SettingsPatch, UserId};
use storage::repository::Storage;
use tracing::{info, warn};

use crate::Clock;
use crate::catalog::{NameCatalog, StaticCatalog};
use crate::error::{BotServicesError, LearningError, ReminderError, SettingsServiceError, ViewError};
use crate::learning_service::LearningService;
use crate::presenter::{self, ReminderStatus, Reply};
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::quiz_sessions::QuizSessionRegistry;
use crate::reminder_service::ReminderService;
use crate::reminders::ReminderTracker;
use crate::settings_service::SettingsService;
use crate::transport::ChatTransport;
use crate::user_directory::UserDirectory;

/// Assembles every bot-facing service over one storage backend and catalog.
///
/// The in-memory registries are shared by all clones, so one `BotServices`
/// can be handed to every request handler.
#[derive(Clone)]
pub struct BotServices {
    clock: Clock,
    catalog: Arc<dyn NameCatalog>,
    users: Arc<UserDirectory>,
    progress: Arc<ProgressService>,
    settings: Arc<SettingsService>,
    learning: Arc<LearningService>,
    quiz: Arc<QuizService>,
    reminders: Arc<ReminderService>,
}

impl BotServices {
    #[must_use]
    pub fn new(storage: &Storage, catalog: Arc<dyn NameCatalog>, clock: Clock) -> Self {
        let progress = ProgressService::new(clock, Arc::clone(&storage.progress));
        let settings = SettingsService::new(Arc::clone(&storage.settings));
        let users = UserDirectory::new(clock, Arc::clone(&storage.users));
        let learning = LearningService::new(Arc::clone(&catalog), progress.clone(), settings.clone());
        let quiz = QuizService::new(
            Arc::clone(&catalog),
            progress.clone(),
            settings.clone(),
            Arc::new(QuizSessionRegistry::new()),
        );
        let reminders = ReminderService::new(
            clock,
            Arc::new(ReminderTracker::new(clock)),
            Arc::clone(&storage.settings),
        );

        Self {
            clock,
            catalog,
            users: Arc::new(users),
            progress: Arc::new(progress),
            settings: Arc::new(settings),
            learning: Arc::new(learning),
            quiz: Arc::new(quiz),
            reminders: Arc::new(reminders),
        }
    }

    /// Build services backed by `SQLite` storage and a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `BotServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog_path: impl AsRef<Path>,
        clock: Clock,
    ) -> Result<Self, BotServicesError> {
        let catalog_path = catalog_path.as_ref();
        let catalog = StaticCatalog::from_path(catalog_path)?;
        info!(path = %catalog_path.display(), names = catalog.len(), "catalog loaded");

        let storage = Storage::sqlite(db_url).await?;
        info!("sqlite storage ready");

        Ok(Self::new(&storage, Arc::new(catalog), clock))
    }

    #[must_use]
    pub fn in_memory(catalog: Arc<dyn NameCatalog>, clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), catalog, clock)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn NameCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserDirectory> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn learning(&self) -> Arc<LearningService> {
        Arc::clone(&self.learning)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn reminders(&self) -> Arc<ReminderService> {
        Arc::clone(&self.reminders)
    }

    /// # Errors
    ///
    /// Returns `ViewError` on progress or settings storage failures.
    pub async fn progress_reply(&self, user_id: UserId) -> Result<Reply, ViewError> {
        let settings = self.settings.get_or_create(user_id).await?;
        let summary = self.progress.summary_for_settings(user_id, &settings).await?;
        Ok(presenter::progress_reply(&summary))
    }

    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn settings_reply(&self, user_id: UserId) -> Result<Reply, SettingsServiceError> {
        let settings = self.settings.get_or_create(user_id).await?;
        let status = ReminderStatus::from_settings(&settings, self.reminders.last_sent(user_id));
        Ok(presenter::settings_reply(&settings, status))
    }

    /// Apply a settings change and render the updated settings screen.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn update_settings(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Reply, SettingsServiceError> {
        self.settings.update(user_id, patch).await?;
        self.settings_reply(user_id).await
    }

    /// # Errors
    ///
    /// Returns `LearningError` on progress or settings storage failures.
    pub async fn learn_today(&self, user_id: UserId) -> Result<Reply, LearningError> {
        let names = self.learning.todays_names(user_id).await?;
        Ok(presenter::daily_names_reply(&names))
    }

    /// Deliver reminders to every user due at the current hour.
    ///
    /// Reminders go to the user's private chat. A failure for one user is
    /// logged and does not stop the others. Returns how many were sent.
    ///
    /// # Errors
    ///
    /// Returns `ReminderError::Storage` if the due users cannot be listed.
    pub async fn send_due_reminders(
        &self,
        transport: &dyn ChatTransport,
    ) -> Result<usize, ReminderError> {
        let targets = self.reminders.due_now().await?;
        let mut sent = 0;
        for user_id in targets {
            let reply = match self.reminder_reply(user_id).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(user = %user_id, error = %err, "skipping reminder");
                    continue;
                }
            };
            let chat = ChatId::new(user_id.value());
            match self.reminders.deliver(user_id, chat, &reply, transport).await {
                Ok(_) => sent += 1,
                Err(err) => warn!(user = %user_id, error = %err, "reminder delivery failed"),
            }
        }
        info!(sent, "due reminders processed");
        Ok(sent)
    }

    async fn reminder_reply(&self, user_id: UserId) -> Result<Reply, ViewError> {
        let settings = self.settings.get_or_create(user_id).await?;
        let summary = self.progress.summary_for_settings(user_id, &settings).await?;
        Ok(presenter::reminder_reply(&summary))
    }
}
