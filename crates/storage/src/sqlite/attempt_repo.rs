use quiz_core::model::{Answer, NewAnswer, NewScore, Progression, ProgressionId, Score};

use super::SqliteRepository;
use super::answer_repo::insert_answer;
use super::mapping::{db, ref_key, row_key};
use super::score_repo::insert_score;
use crate::repository::{AttemptPersistence, StorageError};

#[async_trait::async_trait]
impl AttemptPersistence for SqliteRepository {
    async fn record_answer(
        &self,
        answer: NewAnswer,
        progression: &Progression,
        expected_question_number: u32,
    ) -> Result<Answer, StorageError> {
        let id = row_key(progression.id().value()).ok_or(StorageError::NotFound)?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        // Compare-and-set on the position the caller validated against.
        let res = sqlx::query(
            r"
                UPDATE progressions SET
                    current_question_id = ?2,
                    question_number = ?3,
                    is_finished = ?4,
                    updated_at = ?5
                WHERE id = ?1 AND question_number = ?6 AND is_finished = 0
            ",
        )
        .bind(id)
        .bind(ref_key(progression.current_question_id().value())?)
        .bind(i64::from(progression.question_number()))
        .bind(progression.is_finished())
        .bind(progression.updated_at())
        .bind(i64::from(expected_question_number))
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM progressions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db)?
                .is_some();
            return Err(if exists {
                StorageError::Conflict
            } else {
                StorageError::NotFound
            });
        }

        let answer = insert_answer(&mut *tx, answer).await?;
        tx.commit().await.map_err(db)?;
        Ok(answer)
    }

    async fn finalize_attempt(
        &self,
        score: NewScore,
        progression: ProgressionId,
    ) -> Result<Score, StorageError> {
        let key = row_key(progression.value()).ok_or(StorageError::NotFound)?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query("DELETE FROM progressions WHERE id = ?1")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let score = insert_score(&mut *tx, score).await?;
        tx.commit().await.map_err(db)?;
        Ok(score)
    }
}
