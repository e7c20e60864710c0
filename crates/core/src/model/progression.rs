use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ProgressionId, QuestionId, QuizId, UserId};
use crate::model::quiz::Quiz;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("quiz {0} does not have any questions")]
    NoQuestions(QuizId),

    #[error("quiz is already finished")]
    AlreadyFinished,

    #[error("progression belongs to quiz {expected}, not quiz {actual}")]
    QuizMismatch { expected: QuizId, actual: QuizId },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of an attempt. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptState {
    Active { question_number: u32 },
    Finished,
}

impl AttemptState {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, AttemptState::Finished)
    }
}

//
// ─── NEW PROGRESSION ───────────────────────────────────────────────────────────
//

/// A freshly begun attempt that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgression {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub current_question_id: QuestionId,
    pub created_at: DateTime<Utc>,
}

impl NewProgression {
    /// Begin an attempt positioned on the first question of `quiz`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::NoQuestions` if the quiz is empty.
    pub fn begin(
        user_id: UserId,
        quiz: &Quiz,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ProgressionError> {
        let first = quiz
            .first_question()
            .ok_or(ProgressionError::NoQuestions(quiz.id()))?;
        Ok(Self {
            user_id,
            quiz_id: quiz.id(),
            current_question_id: first.id(),
            created_at: started_at,
        })
    }
}

//
// ─── PROGRESSION ───────────────────────────────────────────────────────────────
//

/// One user's pass through a quiz, one question at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    id: ProgressionId,
    user_id: UserId,
    quiz_id: QuizId,
    current_question_id: QuestionId,
    question_number: u32,
    is_finished: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Progression {
    /// Attach the storage-assigned id to a newly begun attempt.
    #[must_use]
    pub fn started(id: ProgressionId, new: &NewProgression) -> Self {
        Self {
            id,
            user_id: new.user_id,
            quiz_id: new.quiz_id,
            current_question_id: new.current_question_id,
            question_number: 0,
            is_finished: false,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: ProgressionId,
        user_id: UserId,
        quiz_id: QuizId,
        current_question_id: QuestionId,
        question_number: u32,
        is_finished: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            quiz_id,
            current_question_id,
            question_number,
            is_finished,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProgressionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn current_question_id(&self) -> QuestionId {
        self.current_question_id
    }

    /// Number of questions already answered (zero-based index of the current one).
    #[must_use]
    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        if self.is_finished {
            AttemptState::Finished
        } else {
            AttemptState::Active {
                question_number: self.question_number,
            }
        }
    }

    /// Move past the current question after it has been answered.
    ///
    /// Points at the next question of `quiz`, or finishes the attempt when the
    /// answered question was the last one.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::AlreadyFinished` from the terminal state and
    /// `ProgressionError::QuizMismatch` if `quiz` is not the attempted quiz.
    pub fn advance(
        &mut self,
        quiz: &Quiz,
        at: DateTime<Utc>,
    ) -> Result<AttemptState, ProgressionError> {
        if self.is_finished {
            return Err(ProgressionError::AlreadyFinished);
        }
        if quiz.id() != self.quiz_id {
            return Err(ProgressionError::QuizMismatch {
                expected: self.quiz_id,
                actual: quiz.id(),
            });
        }

        self.question_number = self.question_number.saturating_add(1);
        let next = usize::try_from(self.question_number)
            .ok()
            .and_then(|index| quiz.question_at(index));
        match next {
            Some(question) => self.current_question_id = question.id(),
            None => self.is_finished = true,
        }
        self.updated_at = at;

        Ok(self.state())
    }

    /// Force the attempt into the terminal state, regardless of progress.
    pub fn finish(&mut self, at: DateTime<Utc>) {
        if !self.is_finished {
            self.is_finished = true;
            self.updated_at = at;
        }
    }
}
