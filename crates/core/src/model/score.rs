use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{QuizId, ScoreId, UserId};
use crate::model::quiz::AnswerOption;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("quiz {0} does not have any questions")]
    NoQuestions(QuizId),
}

/// Final result of an attempt: the fraction of questions answered correctly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: ScoreId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    #[serde(rename = "score")]
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

impl NewScore {
    /// Score a user's answers for a quiz.
    ///
    /// `chosen` are the options resolved from the user's recorded answers. Each
    /// distinct option counts once, so replaying the same choice does not
    /// inflate the result.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` when `total_questions` is zero.
    pub fn from_chosen_options(
        user_id: UserId,
        quiz_id: QuizId,
        chosen: &[AnswerOption],
        total_questions: usize,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        if total_questions == 0 {
            return Err(ScoreError::NoQuestions(quiz_id));
        }
        let correct = count_correct(chosen);
        Ok(Self {
            user_id,
            quiz_id,
            value: fraction(correct, total_questions),
            created_at,
        })
    }

    #[must_use]
    pub fn into_score(self, id: ScoreId) -> Score {
        Score {
            id,
            user_id: self.user_id,
            quiz_id: self.quiz_id,
            value: self.value,
            created_at: self.created_at,
        }
    }
}

/// Number of distinct correct options in `chosen`.
#[must_use]
pub(crate) fn count_correct(chosen: &[AnswerOption]) -> usize {
    let mut seen = HashSet::with_capacity(chosen.len());
    chosen
        .iter()
        .filter(|o| o.is_correct && seen.insert(o.id))
        .count()
}

#[allow(clippy::cast_precision_loss)]
fn fraction(correct: usize, total: usize) -> f64 {
    correct as f64 / total as f64
}
