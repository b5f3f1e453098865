use async_trait::async_trait;
use names_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, map_user_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn ensure_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, first_name, last_name, username, language_code, active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            ON CONFLICT(id) DO UPDATE SET
                -- created_at stays from the first insert
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                username = excluded.username,
                language_code = excluded.language_code,
                active = 1
            ",
        )
        .bind(user.id().value())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.username())
        .bind(user.language_code())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, first_name, last_name, username, language_code, active, created_at
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET active = ?2 WHERE id = ?1")
            .bind(user_id.value())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
