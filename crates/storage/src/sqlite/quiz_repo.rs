use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerOption, NewOption, NewQuiz, OptionId, Question, QuestionId, Quiz, QuizId, QuizSummary,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, map_option_row, new_row_id, row_key, ser};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query("INSERT INTO quizzes (name, created_at) VALUES (?1, ?2)")
            .bind(quiz.name())
            .bind(quiz.created_at())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        let quiz_key = res.last_insert_rowid();
        let quiz_id = QuizId::new(new_row_id("quiz_id", quiz_key)?);

        let mut questions = Vec::with_capacity(quiz.questions().len());
        for draft in quiz.questions() {
            let res = sqlx::query("INSERT INTO questions (quiz_id, prompt) VALUES (?1, ?2)")
                .bind(quiz_key)
                .bind(draft.prompt())
                .execute(&mut *tx)
                .await
                .map_err(db)?;
            let question_key = res.last_insert_rowid();
            let question_id = QuestionId::new(new_row_id("question_id", question_key)?);

            let mut options = Vec::with_capacity(draft.options().len());
            for option in draft.options() {
                let res = sqlx::query(
                    "INSERT INTO options (question_id, value, is_correct) VALUES (?1, ?2, ?3)",
                )
                .bind(question_key)
                .bind(option.value())
                .bind(option.is_correct())
                .execute(&mut *tx)
                .await
                .map_err(db)?;
                options.push(AnswerOption {
                    id: OptionId::new(new_row_id("option_id", res.last_insert_rowid())?),
                    question_id,
                    value: option.value().to_owned(),
                    is_correct: option.is_correct(),
                });
            }

            questions.push(Question::from_persisted(
                question_id,
                quiz_id,
                draft.prompt(),
                options,
            ));
        }

        tx.commit().await.map_err(db)?;
        tracing::debug!(%quiz_id, questions = questions.len(), "quiz stored");
        Ok(Quiz::from_persisted(
            quiz_id,
            quiz.name(),
            quiz.created_at(),
            questions,
        ))
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let Some(quiz_id) = row_key(id.value()) else {
            return Ok(None);
        };

        let Some(row) = sqlx::query("SELECT id, name, created_at FROM quizzes WHERE id = ?1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
        else {
            return Ok(None);
        };
        let name: String = row.try_get("name").map_err(ser)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

        let option_rows = sqlx::query(
            r"
                SELECT o.id, o.question_id, o.value, o.is_correct
                FROM options o
                JOIN questions q ON q.id = o.question_id
                WHERE q.quiz_id = ?1
                ORDER BY o.id ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut options_by_question: BTreeMap<QuestionId, Vec<AnswerOption>> = BTreeMap::new();
        for row in &option_rows {
            let option = map_option_row(row)?;
            options_by_question
                .entry(option.question_id)
                .or_default()
                .push(option);
        }

        let question_rows =
            sqlx::query("SELECT id, prompt FROM questions WHERE quiz_id = ?1 ORDER BY id ASC")
                .bind(quiz_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let question_id = QuestionId::new(new_row_id(
                "question_id",
                row.try_get::<i64, _>("id").map_err(ser)?,
            )?);
            let prompt: String = row.try_get("prompt").map_err(ser)?;
            let options = options_by_question.remove(&question_id).unwrap_or_default();
            questions.push(Question::from_persisted(question_id, id, prompt, options));
        }

        Ok(Some(Quiz::from_persisted(id, name, created_at, questions)))
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT q.id, q.name, q.created_at, COUNT(qs.id) AS question_count
                FROM quizzes q
                LEFT JOIN questions qs ON qs.quiz_id = q.id
                GROUP BY q.id
                ORDER BY q.id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("question_count").map_err(ser)?;
            out.push(QuizSummary {
                id: QuizId::new(new_row_id("quiz_id", row.try_get("id").map_err(ser)?)?),
                name: row.try_get("name").map_err(ser)?,
                created_at: row.try_get("created_at").map_err(ser)?,
                question_count: u32::try_from(count)
                    .map_err(|_| StorageError::Serialization("question_count overflow".into()))?,
            });
        }
        Ok(out)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let Some(question_id) = row_key(id.value()) else {
            return Ok(None);
        };

        let Some(row) = sqlx::query("SELECT id, quiz_id, prompt FROM questions WHERE id = ?1")
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
        else {
            return Ok(None);
        };
        let quiz_id = QuizId::new(new_row_id(
            "quiz_id",
            row.try_get::<i64, _>("quiz_id").map_err(ser)?,
        )?);
        let prompt: String = row.try_get("prompt").map_err(ser)?;

        let option_rows = sqlx::query(
            r"
                SELECT id, question_id, value, is_correct
                FROM options
                WHERE question_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut options = Vec::with_capacity(option_rows.len());
        for row in &option_rows {
            options.push(map_option_row(row)?);
        }

        Ok(Some(Question::from_persisted(id, quiz_id, prompt, options)))
    }

    async fn find_options(&self, ids: &[OptionId]) -> Result<Vec<AnswerOption>, StorageError> {
        let keys: Vec<i64> = ids.iter().filter_map(|id| row_key(id.value())).collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT id, question_id, value, is_correct
            FROM options
            WHERE id IN (
            ",
        );
        for i in 0..keys.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\nORDER BY id ASC");

        let mut q = sqlx::query(&sql);
        for key in keys {
            q = q.bind(key);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(db)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_option_row(row)?);
        }
        Ok(out)
    }

    async fn rename_quiz(&self, id: QuizId, name: &str) -> Result<bool, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(false);
        };
        let res = sqlx::query("UPDATE quizzes SET name = ?2 WHERE id = ?1")
            .bind(key)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_option(
        &self,
        question: QuestionId,
        option: &NewOption,
    ) -> Result<AnswerOption, StorageError> {
        let key = row_key(question.value()).ok_or(StorageError::NotFound)?;
        // FK failure on a vanished question reads as a missing row to callers.
        let res = sqlx::query(
            "INSERT INTO options (question_id, value, is_correct) VALUES (?1, ?2, ?3)",
        )
        .bind(key)
        .bind(option.value())
        .bind(option.is_correct())
        .execute(&self.pool)
        .await
        .map_err(|e| match db(e) {
            StorageError::Conflict => StorageError::NotFound,
            other => other,
        })?;

        Ok(AnswerOption {
            id: OptionId::new(new_row_id("option_id", res.last_insert_rowid())?),
            question_id: question,
            value: option.value().to_owned(),
            is_correct: option.is_correct(),
        })
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected() > 0)
    }
}
