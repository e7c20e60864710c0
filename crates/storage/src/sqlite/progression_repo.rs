use quiz_core::model::{NewProgression, Progression, ProgressionId};

use super::SqliteRepository;
use super::mapping::{db, map_progression_row, new_row_id, ref_key, row_key};
use crate::repository::{ProgressionRepository, StorageError};

const SELECT_PROGRESSION: &str = r"
    SELECT id, user_id, quiz_id, current_question_id, question_number, is_finished,
           created_at, updated_at
    FROM progressions
    WHERE id = ?1
";

#[async_trait::async_trait]
impl ProgressionRepository for SqliteRepository {
    async fn create_progression(
        &self,
        progression: NewProgression,
    ) -> Result<Progression, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO progressions (
                    user_id, quiz_id, current_question_id, question_number, is_finished,
                    created_at, updated_at
                )
                VALUES (?1, ?2, ?3, 0, 0, ?4, ?4)
            ",
        )
        .bind(ref_key(progression.user_id.value())?)
        .bind(ref_key(progression.quiz_id.value())?)
        .bind(ref_key(progression.current_question_id.value())?)
        .bind(progression.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        let id = ProgressionId::new(new_row_id("progression_id", res.last_insert_rowid())?);
        Ok(Progression::started(id, &progression))
    }

    async fn get_progression(
        &self,
        id: ProgressionId,
    ) -> Result<Option<Progression>, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(None);
        };
        let row = sqlx::query(SELECT_PROGRESSION)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_progression_row).transpose()
    }

    async fn save_progression(&self, progression: &Progression) -> Result<(), StorageError> {
        let key = row_key(progression.id().value()).ok_or(StorageError::NotFound)?;
        let res = sqlx::query(
            r"
                UPDATE progressions SET
                    current_question_id = ?2,
                    question_number = ?3,
                    is_finished = ?4,
                    updated_at = ?5
                WHERE id = ?1
            ",
        )
        .bind(key)
        .bind(ref_key(progression.current_question_id().value())?)
        .bind(i64::from(progression.question_number()))
        .bind(progression.is_finished())
        .bind(progression.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_progression(&self, id: ProgressionId) -> Result<bool, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM progressions WHERE id = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected() > 0)
    }
}
