//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{
    OptionId, ProgressionError, QuestionId, QuizError, QuizId, ScoreError, UserError, UserId,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification callers use to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The request was well formed but not acceptable in the current state.
    Rejected,
    /// The store failed underneath the operation.
    StoreFailure,
}

/// Errors emitted by `QuizEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("user {user} has no score for quiz {quiz}")]
    NoScore { user: UserId, quiz: QuizId },

    #[error("invalid state: {0}")]
    InvalidState(#[from] ProgressionError),

    #[error("invalid input: option {option} is not an answer to question {question}")]
    InvalidInput {
        option: OptionId,
        question: QuestionId,
    },

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::NoScore { .. } | Self::Storage(StorageError::NotFound) => {
                ErrorKind::NotFound
            }
            Self::InvalidState(_) | Self::InvalidInput { .. } | Self::Score(_) => {
                ErrorKind::Rejected
            }
            Self::Storage(_) => ErrorKind::StoreFailure,
        }
    }

    /// Whether repeating the same call may succeed without any change by the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::Conflict | StorageError::Connection(_))
        )
    }
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
