use std::sync::Arc;

use storage::repository::Storage;

use crate::engine::QuizEngine;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;
use crate::user_service::UserService;
use crate::Clock;

/// Assembles the services a front end needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    engine: Arc<QuizEngine>,
    quizzes: Arc<QuizService>,
    users: Arc<UserService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self {
            engine: Arc::new(QuizEngine::from_storage(clock, storage)),
            quizzes: Arc::new(QuizService::new(clock, Arc::clone(&storage.quizzes))),
            users: Arc::new(UserService::new(clock, Arc::clone(&storage.users))),
        }
    }

    #[must_use]
    pub fn engine(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.engine)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }
}
