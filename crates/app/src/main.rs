//! `quiz` command-line front end.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use quiz_core::model::{OptionId, ProgressionId, QuestionId, QuizId, UserId};

mod commands;
mod db;
mod seed;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Multiple-choice quizzes with scoring and ranking")]
struct Cli {
    /// SQLite database URL or path
    #[arg(long, global = true, env = "QUIZ_DB_URL", default_value = db::DEFAULT_DB_URL)]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage quiz takers
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Manage quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommand,
    },

    /// Show a question without revealing the correct option
    Question { id: QuestionId },

    /// Start an attempt at a quiz
    Begin { user: UserId, quiz: QuizId },

    /// Answer the current question of an attempt
    Answer {
        progression: ProgressionId,
        option: OptionId,
    },

    /// Finish an attempt and record its score
    Submit { progression: ProgressionId },

    /// Show a user's score for a quiz
    Score { user: UserId, quiz: QuizId },

    /// Show how a user ranks among everyone who finished a quiz
    Ranking { user: UserId, quiz: QuizId },

    /// Insert a sample quiz and users
    Seed,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register a user
    Create { name: String },
    /// Show a user
    Show { id: UserId },
    /// Change a user's name
    Rename { id: UserId, name: String },
    /// List users ordered by id
    List {
        /// Only these ids (repeatable)
        #[arg(long = "id")]
        ids: Vec<UserId>,
        /// Case-insensitive part of the name
        #[arg(long)]
        name: Option<String>,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
}

#[derive(Subcommand)]
enum QuizCommand {
    /// Create a quiz from a JSON definition file
    Create { file: PathBuf },
    /// Show a quiz with its questions and options
    Show { id: QuizId },
    /// List quizzes
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Change a quiz's name
    Rename { id: QuizId, name: String },
    /// Append an option to a question
    AddOption {
        question: QuestionId,
        value: String,
        /// Mark the option as a correct answer
        #[arg(long)]
        correct: bool,
    },
    /// Delete a quiz and everything recorded against it
    Delete { id: QuizId },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = commands::execute(&cli.db, cli.command).await {
        eprintln!("Error: {e:#}");
        process::exit(commands::exit_code(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_list_collects_repeated_ids() {
        let cli = Cli::try_parse_from([
            "quiz", "user", "list", "--id", "3", "--id", "5", "--name", "ad", "--page", "2",
        ])
        .unwrap();
        let Commands::User {
            action:
                UserCommand::List {
                    ids,
                    name,
                    page,
                    size,
                },
        } = cli.command
        else {
            panic!("expected user list");
        };
        assert_eq!(ids, vec![UserId::new(3), UserId::new(5)]);
        assert_eq!(name.as_deref(), Some("ad"));
        assert_eq!((page, size), (2, 20));
    }

    #[test]
    fn quiz_add_option_defaults_to_wrong() {
        let cli = Cli::try_parse_from(["quiz", "quiz", "add-option", "7", "Blue"]).unwrap();
        let Commands::Quiz {
            action:
                QuizCommand::AddOption {
                    question,
                    value,
                    correct,
                },
        } = cli.command
        else {
            panic!("expected quiz add-option");
        };
        assert_eq!(question, QuestionId::new(7));
        assert_eq!(value, "Blue");
        assert!(!correct);

        let cli =
            Cli::try_parse_from(["quiz", "quiz", "rename", "7", "Sky", "--db", "sqlite::memory:"])
                .unwrap();
        assert_eq!(cli.db, "sqlite::memory:");
        assert!(matches!(
            cli.command,
            Commands::Quiz {
                action: QuizCommand::Rename { .. }
            }
        ));
    }
}
