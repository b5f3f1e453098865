use async_trait::async_trait;
use chrono::{DateTime, Utc};
use names_core::model::{MASTERY_THRESHOLD, NameNumber, NameProgress, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_answer(
        &self,
        user_id: UserId,
        number: NameNumber,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError> {
        // One statement: SET expressions read the pre-update row, so the
        // increment and the promotion check cannot interleave with another writer.
        let row = sqlx::query(
            r"
            INSERT INTO name_progress (
                user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            )
            VALUES (?1, ?2, CASE WHEN ?3 >= ?5 THEN 1 ELSE 0 END, ?4, ?3, 1)
            ON CONFLICT(user_id, name_number) DO UPDATE SET
                correct_count = name_progress.correct_count + excluded.correct_count,
                attempt_count = name_progress.attempt_count + 1,
                last_reviewed_at = excluded.last_reviewed_at,
                learned = CASE
                    WHEN name_progress.learned = 1
                        OR name_progress.correct_count + excluded.correct_count >= ?5
                    THEN 1
                    ELSE 0
                END
            RETURNING
                user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            ",
        )
        .bind(user_id.value())
        .bind(i64::from(number.value()))
        .bind(i64::from(was_correct))
        .bind(at)
        .bind(i64::from(MASTERY_THRESHOLD))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        map_progress_row(&row)
    }

    async fn mark_learned(
        &self,
        user_id: UserId,
        number: NameNumber,
        at: DateTime<Utc>,
    ) -> Result<NameProgress, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO name_progress (
                user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            )
            VALUES (?1, ?2, 1, ?3, 0, 0)
            ON CONFLICT(user_id, name_number) DO UPDATE SET
                learned = 1,
                last_reviewed_at = excluded.last_reviewed_at
            RETURNING
                user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            ",
        )
        .bind(user_id.value())
        .bind(i64::from(number.value()))
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        map_progress_row(&row)
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        number: NameNumber,
    ) -> Result<Option<NameProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            FROM name_progress
            WHERE user_id = ?1 AND name_number = ?2
            ",
        )
        .bind(user_id.value())
        .bind(i64::from(number.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<NameProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, name_number, learned, last_reviewed_at, correct_count, attempt_count
            FROM name_progress
            WHERE user_id = ?1
            ORDER BY name_number ASC
            ",
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }
}
