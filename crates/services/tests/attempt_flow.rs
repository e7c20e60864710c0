use quiz_core::model::{OptionDraft, QuestionDraft, QuizDraft};
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, EngineError, ErrorKind};

fn geography() -> QuizDraft {
    let question = |prompt: &str, answers: &[(&str, bool)]| QuestionDraft {
        prompt: prompt.into(),
        options: answers
            .iter()
            .map(|(value, is_correct)| OptionDraft {
                value: (*value).into(),
                is_correct: *is_correct,
            })
            .collect(),
    };
    QuizDraft {
        name: "Geography".into(),
        questions: vec![
            question("Capital of Peru?", &[("Lima", true), ("Cusco", false)]),
            question("Largest ocean?", &[("Atlantic", false), ("Pacific", true)]),
            question("Highest peak?", &[("Everest", true), ("K2", false)]),
        ],
    }
}

#[tokio::test]
async fn three_players_finish_and_rank() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let quiz = app.quizzes().create_quiz(geography()).await.unwrap();
    let engine = app.engine();

    // Correct answers picked per player: 3, 2, 1.
    let mut players = Vec::new();
    for (name, right) in [("ana", 3), ("ben", 2), ("cy", 1)] {
        let user = app.users().create_user(name).await.unwrap();
        let mut progression = engine.begin(user.id, quiz.id()).await.unwrap();
        for (index, question) in quiz.questions().iter().enumerate() {
            let option = question
                .options()
                .iter()
                .find(|o| o.is_correct == (index < right))
                .unwrap();
            progression = engine
                .submit_answer(progression.id(), option.id)
                .await
                .unwrap();
        }
        assert!(progression.is_finished());
        let score = engine.finalize(progression.id()).await.unwrap();
        assert!((score.value - right as f64 / 3.0).abs() < 1e-9);
        players.push(user.id);
    }

    let best = engine.rank_user(players[0], quiz.id()).await.unwrap();
    assert_eq!(best.rank, 1);
    assert_eq!(best.message, "You were better than 66.67% of all quizzers");

    let middle = engine.rank_user(players[1], quiz.id()).await.unwrap();
    assert_eq!(middle.rank, 2);
    assert_eq!(middle.message, "You were better than 33.33% of all quizzers");

    let last = engine.rank_user(players[2], quiz.id()).await.unwrap();
    assert_eq!(last.rank, 3);
    assert!(last.percent.abs() < 1e-9);
}

#[tokio::test]
async fn advanced_attempt_rejects_previous_question_option() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let quiz = app.quizzes().create_quiz(geography()).await.unwrap();
    let user = app.users().create_user("dee").await.unwrap();
    let engine = app.engine();

    let progression = engine.begin(user.id, quiz.id()).await.unwrap();
    let first = quiz.questions()[0].options()[0].id;
    engine.submit_answer(progression.id(), first).await.unwrap();

    // The first question's option is no longer part of the current question.
    let err = engine
        .submit_answer(progression.id(), first)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn deleting_quiz_ends_open_attempts() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let quiz = app.quizzes().create_quiz(geography()).await.unwrap();
    let user = app.users().create_user("eve").await.unwrap();
    let engine = app.engine();

    let progression = engine.begin(user.id, quiz.id()).await.unwrap();
    assert!(app.quizzes().delete_quiz(quiz.id()).await.unwrap());

    let err = engine.finalize(progression.id()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}
