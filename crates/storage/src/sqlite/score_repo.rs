use quiz_core::model::{NewScore, QuizId, Score, ScoreId, UserId};

use super::SqliteRepository;
use super::mapping::{db, map_score_row, new_row_id, ref_key, row_key};
use crate::repository::{ScoreRepository, StorageError};

pub(super) async fn insert_score<'e, E>(executor: E, score: NewScore) -> Result<Score, StorageError>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let res = sqlx::query(
        r"
            INSERT INTO scores (user_id, quiz_id, score, created_at)
            VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(ref_key(score.user_id.value())?)
    .bind(ref_key(score.quiz_id.value())?)
    .bind(score.value)
    .bind(score.created_at)
    .execute(executor)
    .await
    .map_err(db)?;

    let id = ScoreId::new(new_row_id("score_id", res.last_insert_rowid())?);
    Ok(score.into_score(id))
}

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn create_score(&self, score: NewScore) -> Result<Score, StorageError> {
        insert_score(&self.pool, score).await
    }

    async fn find_scores(&self, quiz: QuizId) -> Result<Vec<Score>, StorageError> {
        let Some(quiz_key) = row_key(quiz.value()) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query(
            r"
                SELECT id, user_id, quiz_id, score, created_at
                FROM scores
                WHERE quiz_id = ?1
                ORDER BY score DESC, id ASC
            ",
        )
        .bind(quiz_key)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_score_row(&row)?);
        }
        Ok(out)
    }

    async fn find_score(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Option<Score>, StorageError> {
        let (Some(user_key), Some(quiz_key)) = (row_key(user.value()), row_key(quiz.value())) else {
            return Ok(None);
        };
        let row = sqlx::query(
            r"
                SELECT id, user_id, quiz_id, score, created_at
                FROM scores
                WHERE user_id = ?1 AND quiz_id = ?2
                ORDER BY id ASC
                LIMIT 1
            ",
        )
        .bind(user_key)
        .bind(quiz_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(map_score_row).transpose()
    }
}
