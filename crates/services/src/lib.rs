#![forbid(unsafe_code)]

pub mod bot_services;
pub mod catalog;
pub mod error;
pub mod learning_service;
pub mod presenter;
pub mod progress_service;
pub mod quiz_service;
pub mod quiz_sessions;
pub mod reminder_service;
pub mod reminders;
pub mod settings_service;
pub mod transport;
pub mod user_directory;

pub use names_core::Clock;

pub use bot_services::BotServices;
pub use catalog::{NameCatalog, StaticCatalog};
pub use error::{
    BotServicesError, CatalogError, LearningError, ProgressServiceError, QuizError, ReminderError,
    SettingsServiceError, UserDirectoryError, ViewError,
};
pub use learning_service::LearningService;
pub use presenter::{MenuAction, ReminderStatus, Reply};
pub use progress_service::ProgressService;
pub use quiz_service::{AnswerOutcome, QuizAnswer, QuizQuestion, QuizService, Response};
pub use quiz_sessions::QuizSessionRegistry;
pub use reminder_service::ReminderService;
pub use reminders::{ReminderRecord, ReminderTracker};
pub use settings_service::SettingsService;
pub use transport::{ChatTransport, MemoryTransport, TransportError};
pub use user_directory::UserDirectory;
