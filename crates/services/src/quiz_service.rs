use std::sync::Arc;

use quiz_core::model::{
    AnswerOption, NewOption, QuestionId, QuestionView, Quiz, QuizDraft, QuizId, QuizSummary,
    normalize_quiz_name,
};
use storage::repository::{QuizRepository, StorageError};

use crate::error::QuizServiceError;
use crate::Clock;

/// Orchestrates quiz authoring and lookup.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { clock, quizzes }
    }

    /// Validate a quiz definition and persist it with its questions and options.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for validation failures.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, QuizServiceError> {
        let new = draft.validate(self.clock.now())?;
        let quiz = self.quizzes.insert_quiz(&new).await?;
        tracing::info!(
            quiz = %quiz.id(),
            questions = quiz.question_count(),
            "quiz created"
        );
        Ok(quiz)
    }

    /// Fetch a quiz with its questions and options.
    ///
    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, QuizServiceError> {
        Ok(self.quizzes.get_quiz(id).await?)
    }

    /// List quizzes ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizSummary>, QuizServiceError> {
        Ok(self.quizzes.list_quizzes(limit).await?)
    }

    /// Fetch a question as shown to a quiz taker, correctness flags removed.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_question(
        &self,
        id: QuestionId,
    ) -> Result<Option<QuestionView>, QuizServiceError> {
        let question = self.quizzes.get_question(id).await?;
        Ok(question.map(|q| q.view()))
    }

    /// Give an existing quiz a new name.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for a blank name.
    /// Returns `QuizServiceError::Storage` with `StorageError::NotFound` if the
    /// quiz does not exist.
    pub async fn rename_quiz(&self, id: QuizId, name: &str) -> Result<Quiz, QuizServiceError> {
        let name = normalize_quiz_name(name)?;
        if !self.quizzes.rename_quiz(id, &name).await? {
            return Err(StorageError::NotFound.into());
        }
        tracing::info!(quiz = %id, "quiz renamed");
        Ok(self
            .quizzes
            .get_quiz(id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }

    /// Append an option to an existing question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for a blank value.
    /// Returns `QuizServiceError::Storage` with `StorageError::NotFound` if the
    /// question does not exist.
    pub async fn add_option(
        &self,
        question: QuestionId,
        value: &str,
        is_correct: bool,
    ) -> Result<AnswerOption, QuizServiceError> {
        let option = NewOption::new(value, is_correct)?;
        let stored = self.quizzes.insert_option(question, &option).await?;
        tracing::info!(%question, option = %stored.id, "option added");
        Ok(stored)
    }

    /// Delete a quiz along with everything recorded against it.
    ///
    /// Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn delete_quiz(&self, id: QuizId) -> Result<bool, QuizServiceError> {
        let deleted = self.quizzes.delete_quiz(id).await?;
        if deleted {
            tracing::info!(quiz = %id, "quiz deleted");
        }
        Ok(deleted)
    }
}
