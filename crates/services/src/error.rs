//! Shared error types for the services crate.

use thiserror::Error;

use names_core::model::NameNumber;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::transport::TransportError;

/// Errors emitted by the name catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("name {0} not found in catalog")]
    NotFound(NameNumber),
    #[error("catalog is empty")]
    Empty,
    #[error("name {0} appears more than once in catalog")]
    Duplicate(NameNumber),
    #[error("catalog could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    InvalidInput(#[from] names_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserDirectory`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserDirectoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LearningService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningError {
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no active quiz")]
    NoActiveQuiz,
    #[error("answer does not belong to the current question")]
    StaleAnswer,
    #[error("quiz length must be greater than zero")]
    InvalidLength,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors emitted by `ReminderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReminderError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while rendering a screen that reads progress and settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ViewError {
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
}

/// Errors emitted while bootstrapping bot services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BotServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
