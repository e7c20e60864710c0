#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AnswerRepository, AttemptPersistence, InMemoryRepository, ProgressionRepository,
    QuizRepository, ScoreRepository, Storage, StorageError, UserRepository,
};
