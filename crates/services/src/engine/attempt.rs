use quiz_core::model::{
    NewAnswer, NewProgression, OptionId, Progression, ProgressionError, ProgressionId,
    QuestionView, QuizId, UserId,
};

use super::QuizEngine;
use crate::error::EngineError;

impl QuizEngine {
    /// Start an attempt for `user_id` at the first question of `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the user or quiz is missing and
    /// `EngineError::InvalidState` if the quiz has no questions.
    pub async fn begin(&self, user_id: UserId, quiz_id: QuizId) -> Result<Progression, EngineError> {
        if self.users.get_user(user_id).await?.is_none() {
            return Err(EngineError::not_found("user", user_id));
        }
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| EngineError::not_found("quiz", quiz_id))?;

        let new = NewProgression::begin(user_id, &quiz, self.clock.now())?;
        let progression = self.progressions.create_progression(new).await?;
        tracing::info!(
            progression = %progression.id(),
            user = %user_id,
            quiz = %quiz_id,
            questions = quiz.question_count(),
            "attempt begun"
        );
        Ok(progression)
    }

    /// Record `option_id` as the answer to the current question and advance.
    ///
    /// The option must belong to the question the attempt is positioned on.
    /// The answer and the advanced progression are written together.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for a missing progression, question or
    /// quiz, `EngineError::InvalidState` for a finished attempt or a question
    /// from another quiz, `EngineError::InvalidInput` for a foreign option and
    /// `EngineError::Storage` if persistence fails, including
    /// `StorageError::Conflict` when a concurrent answer won the race.
    pub async fn submit_answer(
        &self,
        progression_id: ProgressionId,
        option_id: OptionId,
    ) -> Result<Progression, EngineError> {
        let progression = self.load_progression(progression_id).await?;
        if progression.is_finished() {
            tracing::warn!(progression = %progression_id, "answer rejected: attempt finished");
            return Err(ProgressionError::AlreadyFinished.into());
        }

        let question_id = progression.current_question_id();
        let question = self
            .quizzes
            .get_question(question_id)
            .await?
            .ok_or_else(|| EngineError::not_found("question", question_id))?;
        if question.quiz_id() != progression.quiz_id() {
            tracing::warn!(
                progression = %progression_id,
                question = %question_id,
                "answer rejected: question belongs to another quiz"
            );
            return Err(ProgressionError::QuizMismatch {
                expected: progression.quiz_id(),
                actual: question.quiz_id(),
            }
            .into());
        }
        if !question.has_option(option_id) {
            tracing::warn!(
                progression = %progression_id,
                option = %option_id,
                question = %question_id,
                "answer rejected: option not in current question"
            );
            return Err(EngineError::InvalidInput {
                option: option_id,
                question: question_id,
            });
        }

        let quiz = self
            .quizzes
            .get_quiz(progression.quiz_id())
            .await?
            .ok_or_else(|| EngineError::not_found("quiz", progression.quiz_id()))?;

        let now = self.clock.now();
        let mut advanced = progression.clone();
        let state = advanced.advance(&quiz, now)?;
        self.attempts
            .record_answer(
                NewAnswer::for_progression(&progression, option_id, now),
                &advanced,
                progression.question_number(),
            )
            .await?;

        if state.is_finished() {
            tracing::info!(progression = %progression_id, "attempt finished");
        } else {
            tracing::debug!(
                progression = %progression_id,
                question_number = advanced.question_number(),
                "attempt advanced"
            );
        }
        Ok(advanced)
    }

    /// The question an active attempt is waiting on, without correctness flags.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the progression or its question is
    /// missing and `EngineError::InvalidState` once the attempt is finished.
    pub async fn current_question(
        &self,
        progression_id: ProgressionId,
    ) -> Result<QuestionView, EngineError> {
        let progression = self.load_progression(progression_id).await?;
        if progression.is_finished() {
            return Err(ProgressionError::AlreadyFinished.into());
        }
        let question_id = progression.current_question_id();
        let question = self
            .quizzes
            .get_question(question_id)
            .await?
            .ok_or_else(|| EngineError::not_found("question", question_id))?;
        Ok(question.view())
    }

    /// Fetch a stored attempt.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if it does not exist.
    pub async fn get_progression(
        &self,
        progression_id: ProgressionId,
    ) -> Result<Progression, EngineError> {
        self.load_progression(progression_id).await
    }

    pub(super) async fn load_progression(
        &self,
        id: ProgressionId,
    ) -> Result<Progression, EngineError> {
        self.progressions
            .get_progression(id)
            .await?
            .ok_or_else(|| EngineError::not_found("progression", id))
    }
}

#[cfg(test)]
mod tests {
    use quiz_core::model::{AttemptState, OptionId, QuizId, UserId};
    use storage::repository::{AnswerRepository, ProgressionRepository};

    use super::super::test_support::fixture;
    use crate::error::{EngineError, ErrorKind};

    #[tokio::test]
    async fn begin_points_at_first_question() {
        let f = fixture(3).await;
        let progression = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap();

        assert_eq!(progression.question_number(), 0);
        assert_eq!(progression.current_question_id(), f.quiz.questions()[0].id());
        assert!(!progression.is_finished());
        assert_eq!(
            progression.state(),
            AttemptState::Active { question_number: 0 }
        );
    }

    #[tokio::test]
    async fn begin_rejects_empty_quiz() {
        let f = fixture(0).await;
        let err = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[tokio::test]
    async fn begin_requires_known_user_and_quiz() {
        let f = fixture(1).await;
        let err = f
            .engine
            .begin(UserId::new(404), f.quiz.id())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "user", .. }));

        let err = f
            .engine
            .begin(f.user.id, QuizId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "quiz", .. }));
    }

    #[tokio::test]
    async fn foreign_option_leaves_progression_untouched() {
        let f = fixture(2).await;
        let started = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap();
        let second_question_option = f.quiz.questions()[1].options()[0].id;

        let err = f
            .engine
            .submit_answer(started.id(), second_question_option)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));

        let err = f
            .engine
            .submit_answer(started.id(), OptionId::new(9_999))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));

        let stored = f.repo.get_progression(started.id()).await.unwrap().unwrap();
        assert_eq!(stored, started);
        assert!(
            f.repo
                .find_answers(f.user.id, f.quiz.id())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn finishes_exactly_after_last_question() {
        let f = fixture(3).await;
        let mut progression = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap();

        for (index, question) in f.quiz.questions().iter().enumerate() {
            assert!(!progression.is_finished(), "finished early at {index}");
            progression = f
                .engine
                .submit_answer(progression.id(), question.options()[1].id)
                .await
                .unwrap();
        }

        assert!(progression.is_finished());
        assert_eq!(progression.question_number(), 3);
        let stored = f.engine.get_progression(progression.id()).await.unwrap();
        assert_eq!(stored, progression);
    }

    #[tokio::test]
    async fn finished_attempt_rejects_any_option() {
        let f = fixture(1).await;
        let progression = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap();
        let right = f.quiz.questions()[0].options()[0].id;
        f.engine
            .submit_answer(progression.id(), right)
            .await
            .unwrap();

        for option in [right, OptionId::new(9_999)] {
            let err = f
                .engine
                .submit_answer(progression.id(), option)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidState(_)));
        }
        assert_eq!(
            f.repo
                .find_answers(f.user.id, f.quiz.id())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn current_question_hides_correctness() {
        let f = fixture(2).await;
        let progression = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap();

        let view = f.engine.current_question(progression.id()).await.unwrap();
        assert_eq!(view.id, f.quiz.questions()[0].id());
        assert_eq!(view.options.len(), 2);

        let progression = f
            .engine
            .submit_answer(progression.id(), f.quiz.questions()[0].options()[0].id)
            .await
            .unwrap();
        let view = f.engine.current_question(progression.id()).await.unwrap();
        assert_eq!(view.id, f.quiz.questions()[1].id());
    }

    #[tokio::test]
    async fn unknown_progression_is_not_found() {
        let f = fixture(1).await;
        let err = f
            .engine
            .submit_answer(
                quiz_core::model::ProgressionId::new(77),
                f.quiz.questions()[0].options()[0].id,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let f = fixture(1).await;
        f.repo.set_unavailable(true);
        let err = f.engine.begin(f.user.id, f.quiz.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(err.is_retryable());
    }
}
