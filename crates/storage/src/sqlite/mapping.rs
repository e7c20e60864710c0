use quiz_core::model::{
    Answer, AnswerId, AnswerOption, OptionId, Progression, ProgressionId, QuestionId, QuizId,
    Score, ScoreId, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver failures; foreign key violations mean a referenced row is missing.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref inner) = e {
        if inner.is_foreign_key_violation() {
            return StorageError::Conflict;
        }
    }
    StorageError::Connection(e.to_string())
}

/// Key of an existing row. Ids above `i64::MAX` cannot name one.
pub(crate) fn row_key(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

/// Key written to a referencing column; an unrepresentable id references nothing.
pub(crate) fn ref_key(id: u64) -> Result<i64, StorageError> {
    row_key(id).ok_or(StorageError::Conflict)
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn get_u64(row: &SqliteRow, column: &'static str) -> Result<u64, StorageError> {
    i64_to_u64(column, row.try_get::<i64, _>(column).map_err(ser)?)
}

pub(crate) fn new_row_id(field: &'static str, v: i64) -> Result<u64, StorageError> {
    i64_to_u64(field, v)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: UserId::new(get_u64(row, "id")?),
        name: row.try_get("name").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_option_row(row: &SqliteRow) -> Result<AnswerOption, StorageError> {
    Ok(AnswerOption {
        id: OptionId::new(get_u64(row, "id")?),
        question_id: QuestionId::new(get_u64(row, "question_id")?),
        value: row.try_get("value").map_err(ser)?,
        is_correct: row.try_get::<bool, _>("is_correct").map_err(ser)?,
    })
}

pub(crate) fn map_progression_row(row: &SqliteRow) -> Result<Progression, StorageError> {
    let question_number: i64 = row.try_get("question_number").map_err(ser)?;
    let question_number = u32::try_from(question_number).map_err(|_| {
        StorageError::Serialization(format!("invalid question_number: {question_number}"))
    })?;

    Ok(Progression::from_persisted(
        ProgressionId::new(get_u64(row, "id")?),
        UserId::new(get_u64(row, "user_id")?),
        QuizId::new(get_u64(row, "quiz_id")?),
        QuestionId::new(get_u64(row, "current_question_id")?),
        question_number,
        row.try_get::<bool, _>("is_finished").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<Answer, StorageError> {
    Ok(Answer {
        id: AnswerId::new(get_u64(row, "id")?),
        user_id: UserId::new(get_u64(row, "user_id")?),
        option_id: OptionId::new(get_u64(row, "option_id")?),
        quiz_id: QuizId::new(get_u64(row, "quiz_id")?),
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_score_row(row: &SqliteRow) -> Result<Score, StorageError> {
    Ok(Score {
        id: ScoreId::new(get_u64(row, "id")?),
        user_id: UserId::new(get_u64(row, "user_id")?),
        quiz_id: QuizId::new(get_u64(row, "quiz_id")?),
        value: row.try_get("score").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
