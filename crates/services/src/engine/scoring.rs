use quiz_core::model::{
    NewScore, OptionId, ProgressionError, ProgressionId, QuizId, Ranking, Score, UserId,
};

use super::QuizEngine;
use crate::error::EngineError;

impl QuizEngine {
    /// End an attempt, score it, and discard the progression.
    ///
    /// Finalizing does not require the attempt to have reached its last
    /// question; unanswered questions count as wrong. The score covers the
    /// user's answers for the quiz recorded since the attempt began, each
    /// distinct correct option counting once.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the progression or quiz is gone
    /// (a repeated finalize included), `EngineError::InvalidState` if the quiz
    /// has no questions and `EngineError::Storage` if persistence fails.
    pub async fn finalize(&self, progression_id: ProgressionId) -> Result<Score, EngineError> {
        let now = self.clock.now();
        let mut progression = self.load_progression(progression_id).await?;
        progression.finish(now);

        let quiz_id = progression.quiz_id();
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| EngineError::not_found("quiz", quiz_id))?;
        if quiz.question_count() == 0 {
            return Err(ProgressionError::NoQuestions(quiz_id).into());
        }

        let chosen: Vec<OptionId> = self
            .answers
            .find_answers(progression.user_id(), quiz_id)
            .await?
            .into_iter()
            .filter(|answer| answer.created_at >= progression.created_at())
            .map(|answer| answer.option_id)
            .collect();
        let options = self.quizzes.find_options(&chosen).await?;

        let score = NewScore::from_chosen_options(
            progression.user_id(),
            quiz_id,
            &options,
            quiz.question_count(),
            now,
        )?;
        let score = self.attempts.finalize_attempt(score, progression_id).await?;
        tracing::info!(
            progression = %progression_id,
            user = %score.user_id,
            quiz = %quiz_id,
            score = score.value,
            "attempt finalized"
        );
        Ok(score)
    }

    /// Where `user_id` stands among everyone who finished `quiz_id`.
    ///
    /// A user without a score gets `Ranking::not_found()`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the scores cannot be read.
    pub async fn rank_user(&self, user_id: UserId, quiz_id: QuizId) -> Result<Ranking, EngineError> {
        let scores = self.scores.find_scores(quiz_id).await?;
        let ranking = Ranking::for_user(user_id, &scores);
        tracing::debug!(
            user = %user_id,
            quiz = %quiz_id,
            rank = ranking.rank,
            found = ranking.is_found(),
            participants = scores.len(),
            "ranked user"
        );
        Ok(ranking)
    }

    /// The score `user_id` earned on `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoScore` if the user never finalized the quiz.
    pub async fn user_score(&self, user_id: UserId, quiz_id: QuizId) -> Result<Score, EngineError> {
        self.scores
            .find_score(user_id, quiz_id)
            .await?
            .ok_or(EngineError::NoScore {
                user: user_id,
                quiz: quiz_id,
            })
    }
}
