use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::TOTAL_NAMES;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("names per day must be between 1 and 99, got {0}")]
    InvalidPace(i64),

    #[error("reminder hour must be between 0 and 23, got {0}")]
    InvalidReminderHour(i64),

    #[error("unknown quiz mode: {0}")]
    UnknownQuizMode(String),

    #[error("unknown learning mode: {0}")]
    UnknownLearningMode(String),
}

//
// ─── VALUE TYPES ───────────────────────────────────────────────────────────────
//

/// Learning pace: how many new names the user takes on per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamesPerDay(u32);

impl NamesPerDay {
    pub const DEFAULT: NamesPerDay = NamesPerDay(3);

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidPace` for zero or more than 99.
    pub fn new(value: u32) -> Result<Self, SettingsError> {
        if value == 0 || value > u32::from(TOTAL_NAMES) {
            return Err(SettingsError::InvalidPace(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// Validates a signed pace as typed by a user or read from storage.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidPace` for values outside `1..=99`.
    pub fn from_i64(value: i64) -> Result<Self, SettingsError> {
        u32::try_from(value)
            .map_err(|_| SettingsError::InvalidPace(value))
            .and_then(Self::new)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// UTC hour of day at which the daily reminder goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderHour(u8);

impl ReminderHour {
    pub const DEFAULT: ReminderHour = ReminderHour(9);

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidReminderHour` above 23.
    pub fn new(hour: u8) -> Result<Self, SettingsError> {
        if hour > 23 {
            return Err(SettingsError::InvalidReminderHour(i64::from(hour)));
        }
        Ok(Self(hour))
    }

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidReminderHour` outside `0..=23`.
    pub fn from_i64(value: i64) -> Result<Self, SettingsError> {
        u8::try_from(value)
            .map_err(|_| SettingsError::InvalidReminderHour(value))
            .and_then(Self::new)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// How quiz questions are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuizMode {
    /// Pick the meaning among several options.
    #[default]
    MultipleChoice,
    /// Recall the meaning, reveal it, then self-grade.
    FreeRecall,
}

impl QuizMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::MultipleChoice => "multiple_choice",
            QuizMode::FreeRecall => "free_recall",
        }
    }
}

impl FromStr for QuizMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple_choice" => Ok(QuizMode::MultipleChoice),
            "free_recall" => Ok(QuizMode::FreeRecall),
            other => Err(SettingsError::UnknownQuizMode(other.to_owned())),
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::MultipleChoice => f.write_str("multiple choice"),
            QuizMode::FreeRecall => f.write_str("free recall"),
        }
    }
}

/// Order in which new names are introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LearningMode {
    /// Follow the catalog order, 1 to 99.
    #[default]
    Sequential,
    /// Draw unlearned names at random.
    Random,
}

impl LearningMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LearningMode::Sequential => "sequential",
            LearningMode::Random => "random",
        }
    }
}

impl FromStr for LearningMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sequential" => Ok(LearningMode::Sequential),
            "random" => Ok(LearningMode::Random),
            other => Err(SettingsError::UnknownLearningMode(other.to_owned())),
        }
    }
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningMode::Sequential => f.write_str("sequential"),
            LearningMode::Random => f.write_str("random"),
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Per-user configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    names_per_day: NamesPerDay,
    quiz_mode: QuizMode,
    learning_mode: LearningMode,
    reminders_enabled: bool,
    reminder_hour: ReminderHour,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            names_per_day: NamesPerDay::DEFAULT,
            quiz_mode: QuizMode::default(),
            learning_mode: LearningMode::default(),
            reminders_enabled: true,
            reminder_hour: ReminderHour::DEFAULT,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new(
        names_per_day: NamesPerDay,
        quiz_mode: QuizMode,
        learning_mode: LearningMode,
        reminders_enabled: bool,
        reminder_hour: ReminderHour,
    ) -> Self {
        Self {
            names_per_day,
            quiz_mode,
            learning_mode,
            reminders_enabled,
            reminder_hour,
        }
    }

    /// Returns a copy with every `Some` field of `patch` applied.
    #[must_use]
    pub fn apply(&self, patch: &SettingsPatch) -> Self {
        Self {
            names_per_day: patch.names_per_day.unwrap_or(self.names_per_day),
            quiz_mode: patch.quiz_mode.unwrap_or(self.quiz_mode),
            learning_mode: patch.learning_mode.unwrap_or(self.learning_mode),
            reminders_enabled: patch.reminders_enabled.unwrap_or(self.reminders_enabled),
            reminder_hour: patch.reminder_hour.unwrap_or(self.reminder_hour),
        }
    }

    #[must_use]
    pub fn names_per_day(&self) -> NamesPerDay {
        self.names_per_day
    }

    #[must_use]
    pub fn quiz_mode(&self) -> QuizMode {
        self.quiz_mode
    }

    #[must_use]
    pub fn learning_mode(&self) -> LearningMode {
        self.learning_mode
    }

    #[must_use]
    pub fn reminders_enabled(&self) -> bool {
        self.reminders_enabled
    }

    #[must_use]
    pub fn reminder_hour(&self) -> ReminderHour {
        self.reminder_hour
    }
}

/// Sparse change set for [`Settings`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub names_per_day: Option<NamesPerDay>,
    pub quiz_mode: Option<QuizMode>,
    pub learning_mode: Option<LearningMode>,
    pub reminders_enabled: Option<bool>,
    pub reminder_hour: Option<ReminderHour>,
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn with_names_per_day(mut self, pace: NamesPerDay) -> Self {
        self.names_per_day = Some(pace);
        self
    }

    #[must_use]
    pub fn with_quiz_mode(mut self, mode: QuizMode) -> Self {
        self.quiz_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_learning_mode(mut self, mode: LearningMode) -> Self {
        self.learning_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_reminders_enabled(mut self, enabled: bool) -> Self {
        self.reminders_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_reminder_hour(mut self, hour: ReminderHour) -> Self {
        self.reminder_hour = Some(hour);
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
