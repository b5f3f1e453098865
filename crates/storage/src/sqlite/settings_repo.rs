use async_trait::async_trait;
use names_core::model::{ReminderHour, Settings, SettingsPatch, UserId};
use sqlx::{Executor, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{db_err, map_settings_row};
use crate::repository::{SettingsRepository, StorageError};

async fn insert_defaults<'e, E>(
    executor: E,
    user_id: UserId,
    defaults: &Settings,
) -> Result<(), StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO user_settings (
            user_id, names_per_day, quiz_mode, learning_mode, reminders_enabled, reminder_hour
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(user_id) DO NOTHING
        ",
    )
    .bind(user_id.value())
    .bind(i64::from(defaults.names_per_day().value()))
    .bind(defaults.quiz_mode().as_str())
    .bind(defaults.learning_mode().as_str())
    .bind(defaults.reminders_enabled())
    .bind(i64::from(defaults.reminder_hour().value()))
    .execute(executor)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn select_settings<'e, E>(executor: E, user_id: UserId) -> Result<Settings, StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r"
        SELECT names_per_day, quiz_mode, learning_mode, reminders_enabled, reminder_hour
        FROM user_settings
        WHERE user_id = ?1
        ",
    )
    .bind(user_id.value())
    .fetch_one(executor)
    .await
    .map_err(db_err)?;

    map_settings_row(&row)
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_or_create(
        &self,
        user_id: UserId,
        defaults: &Settings,
    ) -> Result<Settings, StorageError> {
        // Both statements autocommit; the conflict clause keeps one row.
        insert_defaults(&self.pool, user_id, defaults).await?;
        select_settings(&self.pool, user_id).await
    }

    async fn update(
        &self,
        user_id: UserId,
        patch: &SettingsPatch,
        defaults: &Settings,
    ) -> Result<Settings, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_defaults(&mut *tx, user_id, defaults).await?;

        // NULL binds leave the column as it is.
        sqlx::query(
            r"
            UPDATE user_settings SET
                names_per_day = COALESCE(?2, names_per_day),
                quiz_mode = COALESCE(?3, quiz_mode),
                learning_mode = COALESCE(?4, learning_mode),
                reminders_enabled = COALESCE(?5, reminders_enabled),
                reminder_hour = COALESCE(?6, reminder_hour)
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.value())
        .bind(patch.names_per_day.map(|p| i64::from(p.value())))
        .bind(patch.quiz_mode.map(|m| m.as_str()))
        .bind(patch.learning_mode.map(|m| m.as_str()))
        .bind(patch.reminders_enabled)
        .bind(patch.reminder_hour.map(|h| i64::from(h.value())))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let settings = select_settings(&mut *tx, user_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(settings)
    }

    async fn list_reminder_targets(
        &self,
        hour: ReminderHour,
    ) -> Result<Vec<UserId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT s.user_id
            FROM user_settings s
            JOIN users u ON u.id = s.user_id
            WHERE s.reminders_enabled = 1 AND s.reminder_hour = ?1 AND u.active = 1
            ORDER BY s.user_id ASC
            ",
        )
        .bind(i64::from(hour.value()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                row.try_get::<i64, _>("user_id")
                    .map(UserId::new)
                    .map_err(|err| StorageError::Serialization(err.to_string()))
            })
            .collect()
    }
}
