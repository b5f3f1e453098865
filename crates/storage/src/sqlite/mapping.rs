use names_core::model::{
    LearningMode, NameNumber, NameProgress, NamesPerDay, QuizMode, ReminderHour, Settings, User,
    UserId, UserProfile,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn count_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<NameProgress, StorageError> {
    let user_id = UserId::new(row.try_get::<i64, _>("user_id").map_err(ser)?);
    let number = NameNumber::from_i64(row.try_get::<i64, _>("name_number").map_err(ser)?)
        .map_err(ser)?;
    let learned: bool = row.try_get("learned").map_err(ser)?;
    let last_reviewed_at = row.try_get("last_reviewed_at").map_err(ser)?;
    let correct_count =
        count_from_i64("correct_count", row.try_get("correct_count").map_err(ser)?)?;
    let attempt_count =
        count_from_i64("attempt_count", row.try_get("attempt_count").map_err(ser)?)?;

    Ok(NameProgress::from_persisted(
        user_id,
        number,
        learned,
        last_reviewed_at,
        correct_count,
        attempt_count,
    ))
}

pub(crate) fn map_settings_row(row: &SqliteRow) -> Result<Settings, StorageError> {
    let names_per_day =
        NamesPerDay::from_i64(row.try_get::<i64, _>("names_per_day").map_err(ser)?)
            .map_err(ser)?;
    let quiz_mode: QuizMode = row
        .try_get::<String, _>("quiz_mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let learning_mode: LearningMode = row
        .try_get::<String, _>("learning_mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let reminders_enabled: bool = row.try_get("reminders_enabled").map_err(ser)?;
    let reminder_hour =
        ReminderHour::from_i64(row.try_get::<i64, _>("reminder_hour").map_err(ser)?)
            .map_err(ser)?;

    Ok(Settings::new(
        names_per_day,
        quiz_mode,
        learning_mode,
        reminders_enabled,
        reminder_hour,
    ))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let profile = UserProfile {
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        username: row.try_get("username").map_err(ser)?,
        language_code: row.try_get("language_code").map_err(ser)?,
    };

    Ok(User::from_persisted(
        UserId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        profile,
        row.try_get("active").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn db_err(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        other => StorageError::Connection(other.to_string()),
    }
}
