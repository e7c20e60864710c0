mod answer;
mod ids;
mod progression;
mod quiz;
mod ranking;
mod score;
mod user;

pub use ids::{AnswerId, OptionId, ParseIdError, ProgressionId, QuestionId, QuizId, ScoreId, UserId};

pub use answer::{Answer, NewAnswer};
pub use progression::{AttemptState, NewProgression, Progression, ProgressionError};
pub use quiz::{
    AnswerOption, NewOption, NewQuestion, NewQuiz, OptionDraft, OptionView, Question,
    QuestionDraft, QuestionView, Quiz, QuizDraft, QuizError, QuizSummary, normalize_quiz_name,
};
pub use ranking::{NOT_FOUND_MESSAGE, ONLY_FINISHER_MESSAGE, Ranking};
pub use score::{NewScore, Score, ScoreError};
pub use user::{NewUser, Page, User, UserError, UserFilter, normalize_user_name};
