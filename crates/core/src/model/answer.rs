use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{AnswerId, OptionId, QuizId, UserId};
use crate::model::progression::Progression;

/// A recorded choice. Immutable once stored.
///
/// Answers are not linked to a question directly: correctness is derived
/// through the chosen option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: AnswerId,
    pub user_id: UserId,
    pub option_id: OptionId,
    pub quiz_id: QuizId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub user_id: UserId,
    pub option_id: OptionId,
    pub quiz_id: QuizId,
    pub created_at: DateTime<Utc>,
}

impl NewAnswer {
    /// Answer chosen by the owner of `progression` within its quiz.
    #[must_use]
    pub fn for_progression(
        progression: &Progression,
        option_id: OptionId,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: progression.user_id(),
            option_id,
            quiz_id: progression.quiz_id(),
            created_at: answered_at,
        }
    }

    #[must_use]
    pub fn into_answer(self, id: AnswerId) -> Answer {
        Answer {
            id,
            user_id: self.user_id,
            option_id: self.option_id,
            quiz_id: self.quiz_id,
            created_at: self.created_at,
        }
    }
}
