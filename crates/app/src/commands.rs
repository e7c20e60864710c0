//! Command dispatch. Results go to stdout as JSON.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use quiz_core::model::{QuizDraft, UserFilter};
use serde::Serialize;
use services::{AppServices, Clock, EngineError, ErrorKind, QuizServiceError, UserServiceError};

use crate::db::{normalize_sqlite_url, prepare_sqlite_file};
use crate::{Commands, QuizCommand, UserCommand, seed};

const EXIT_FAILURE: i32 = 1;
const EXIT_REJECTED: i32 = 2;

pub async fn execute(db: &str, command: Commands) -> Result<()> {
    let db_url = normalize_sqlite_url(db);
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::system())
        .await
        .with_context(|| format!("opening {db_url}"))?;

    match command {
        Commands::User { action } => user(&app, action).await,
        Commands::Quiz { action } => quiz(&app, action).await,
        Commands::Question { id } => {
            let view = app
                .quizzes()
                .get_question(id)
                .await?
                .ok_or_else(|| anyhow!("question {id} not found"))?;
            print_json(&view)
        }
        Commands::Begin { user, quiz } => print_json(&app.engine().begin(user, quiz).await?),
        Commands::Answer {
            progression,
            option,
        } => print_json(&app.engine().submit_answer(progression, option).await?),
        Commands::Submit { progression } => print_json(&app.engine().finalize(progression).await?),
        Commands::Score { user, quiz } => print_json(&app.engine().user_score(user, quiz).await?),
        Commands::Ranking { user, quiz } => print_json(&app.engine().rank_user(user, quiz).await?),
        Commands::Seed => print_json(&seed::run(&app).await?),
    }
}

async fn user(app: &AppServices, action: UserCommand) -> Result<()> {
    match action {
        UserCommand::Create { name } => print_json(&app.users().create_user(name).await?),
        UserCommand::Show { id } => {
            let user = app
                .users()
                .get_user(id)
                .await?
                .ok_or_else(|| anyhow!("user {id} not found"))?;
            print_json(&user)
        }
        UserCommand::Rename { id, name } => print_json(&app.users().rename_user(id, &name).await?),
        UserCommand::List {
            ids,
            name,
            page,
            size,
        } => {
            let filter = UserFilter { ids, name };
            print_json(&app.users().list_users(&filter, page, size).await?)
        }
    }
}

async fn quiz(app: &AppServices, action: QuizCommand) -> Result<()> {
    match action {
        QuizCommand::Create { file } => {
            let draft = read_quiz_file(&file)?;
            print_json(&app.quizzes().create_quiz(draft).await?)
        }
        QuizCommand::Show { id } => {
            let quiz = app
                .quizzes()
                .get_quiz(id)
                .await?
                .ok_or_else(|| anyhow!("quiz {id} not found"))?;
            print_json(&quiz)
        }
        QuizCommand::List { limit } => print_json(&app.quizzes().list_quizzes(limit).await?),
        QuizCommand::Rename { id, name } => {
            print_json(&app.quizzes().rename_quiz(id, &name).await?)
        }
        QuizCommand::AddOption {
            question,
            value,
            correct,
        } => print_json(&app.quizzes().add_option(question, &value, correct).await?),
        QuizCommand::Delete { id } => {
            let deleted = app.quizzes().delete_quiz(id).await?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
    }
}

fn read_quiz_file(path: &Path) -> Result<QuizDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Client-caused rejections exit with 2, everything else with 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(engine) = err.downcast_ref::<EngineError>() {
        return match engine.kind() {
            ErrorKind::Rejected => EXIT_REJECTED,
            ErrorKind::NotFound | ErrorKind::StoreFailure => EXIT_FAILURE,
        };
    }
    if matches!(
        err.downcast_ref::<QuizServiceError>(),
        Some(QuizServiceError::Quiz(_))
    ) || matches!(
        err.downcast_ref::<UserServiceError>(),
        Some(UserServiceError::User(_))
    ) || err.downcast_ref::<serde_json::Error>().is_some()
    {
        return EXIT_REJECTED;
    }
    EXIT_FAILURE
}
