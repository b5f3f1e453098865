mod ids;
mod name;
mod progress;
mod settings;
mod summary;
mod user;

pub use ids::{ChatId, MessageId, NameNumber, NameNumberError, ParseIdError, TOTAL_NAMES, UserId};
pub use name::Name;
pub use progress::{MASTERY_THRESHOLD, NameProgress, NameState};
pub use settings::{
    LearningMode, NamesPerDay, QuizMode, ReminderHour, Settings, SettingsError, SettingsPatch,
};
pub use summary::ProgressSummary;
pub use user::{User, UserProfile};
