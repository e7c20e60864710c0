use quiz_core::model::{Answer, AnswerId, NewAnswer, QuizId, UserId};

use super::SqliteRepository;
use super::mapping::{db, map_answer_row, new_row_id, ref_key, row_key};
use crate::repository::{AnswerRepository, StorageError};

pub(super) async fn insert_answer<'e, E>(executor: E, answer: NewAnswer) -> Result<Answer, StorageError>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let res = sqlx::query(
        r"
            INSERT INTO answers (user_id, option_id, quiz_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(ref_key(answer.user_id.value())?)
    .bind(ref_key(answer.option_id.value())?)
    .bind(ref_key(answer.quiz_id.value())?)
    .bind(answer.created_at)
    .execute(executor)
    .await
    .map_err(db)?;

    let id = AnswerId::new(new_row_id("answer_id", res.last_insert_rowid())?);
    Ok(answer.into_answer(id))
}

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError> {
        insert_answer(&self.pool, answer).await
    }

    async fn find_answers(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Vec<Answer>, StorageError> {
        let (Some(user_key), Some(quiz_key)) = (row_key(user.value()), row_key(quiz.value())) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query(
            r"
                SELECT id, user_id, option_id, quiz_id, created_at
                FROM answers
                WHERE user_id = ?1 AND quiz_id = ?2
                ORDER BY id ASC
            ",
        )
        .bind(user_key)
        .bind(quiz_key)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_answer_row(&row)?);
        }
        Ok(out)
    }
}
