//! Sample content for trying the CLI against a fresh database.

use anyhow::Result;
use quiz_core::model::{OptionDraft, QuestionDraft, Quiz, QuizDraft, User};
use serde::Serialize;
use services::AppServices;

#[derive(Debug, Serialize)]
pub struct Seeded {
    pub quiz: Quiz,
    pub users: Vec<User>,
}

const QUESTIONS: &[(&str, &[(&str, bool)])] = &[
    (
        "Which planet is closest to the Sun?",
        &[("Mercury", true), ("Venus", false), ("Mars", false)],
    ),
    (
        "Which planet has the most confirmed moons?",
        &[("Jupiter", false), ("Saturn", true), ("Neptune", false)],
    ),
    (
        "What is the largest planet?",
        &[("Earth", false), ("Uranus", false), ("Jupiter", true)],
    ),
];

const USERS: &[&str] = &["alice", "bob", "carol"];

fn sample_quiz() -> QuizDraft {
    QuizDraft {
        name: "Solar System".into(),
        questions: QUESTIONS
            .iter()
            .map(|(prompt, options)| QuestionDraft {
                prompt: (*prompt).into(),
                options: options
                    .iter()
                    .map(|(value, is_correct)| OptionDraft {
                        value: (*value).into(),
                        is_correct: *is_correct,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Insert the sample quiz and users.
///
/// # Errors
///
/// Propagates service failures.
pub async fn run(app: &AppServices) -> Result<Seeded> {
    let quiz = app.quizzes().create_quiz(sample_quiz()).await?;
    let mut users = Vec::with_capacity(USERS.len());
    for name in USERS {
        users.push(app.users().create_user(*name).await?);
    }
    tracing::info!(quiz = %quiz.id(), users = users.len(), "seeded sample data");
    Ok(Seeded { quiz, users })
}
