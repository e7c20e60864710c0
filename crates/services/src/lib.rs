#![forbid(unsafe_code)]

pub mod app_services;
pub mod engine;
pub mod error;
pub mod quiz_service;
pub mod user_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use engine::QuizEngine;
pub use error::{AppServicesError, EngineError, ErrorKind, QuizServiceError, UserServiceError};
pub use quiz_service::QuizService;
pub use user_service::UserService;
