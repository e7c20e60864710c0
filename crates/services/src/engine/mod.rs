//! Progression and scoring engine.
//!
//! Every public operation is one short sequence of store calls. Writes that
//! must land together go through `AttemptPersistence`.

mod attempt;
mod scoring;

use std::sync::Arc;

use storage::repository::{
    AnswerRepository, AttemptPersistence, ProgressionRepository, QuizRepository,
    ScoreRepository, Storage, UserRepository,
};

use crate::Clock;

/// Runs attempts: begin, answer, finalize, and ranking.
#[derive(Clone)]
pub struct QuizEngine {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    quizzes: Arc<dyn QuizRepository>,
    progressions: Arc<dyn ProgressionRepository>,
    answers: Arc<dyn AnswerRepository>,
    scores: Arc<dyn ScoreRepository>,
    attempts: Arc<dyn AttemptPersistence>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        quizzes: Arc<dyn QuizRepository>,
        progressions: Arc<dyn ProgressionRepository>,
        answers: Arc<dyn AnswerRepository>,
        scores: Arc<dyn ScoreRepository>,
        attempts: Arc<dyn AttemptPersistence>,
    ) -> Self {
        Self {
            clock,
            users,
            quizzes,
            progressions,
            answers,
            scores,
            attempts,
        }
    }

    /// Build an engine over every handle of `storage`.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.progressions),
            Arc::clone(&storage.answers),
            Arc::clone(&storage.scores),
            Arc::clone(&storage.attempts),
        )
    }
}
