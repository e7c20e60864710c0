use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz name cannot be empty")]
    EmptyName,

    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },

    #[error("question {index} has no options")]
    NoOptions { index: usize },

    #[error("option {option} of question {question} has an empty value")]
    EmptyOptionValue { question: usize, option: usize },

    #[error("option value cannot be empty")]
    EmptyValue,
}

/// Trim a quiz name, rejecting blank ones.
///
/// # Errors
///
/// Returns `QuizError::EmptyName` if nothing is left after trimming.
pub fn normalize_quiz_name(raw: &str) -> Result<String, QuizError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(QuizError::EmptyName);
    }
    Ok(name.to_owned())
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// A selectable answer for a question.
///
/// `is_correct` is server-side knowledge; use [`OptionView`] for anything shown
/// to the quiz taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub value: String,
    pub is_correct: bool,
}

/// Public projection of an option, without the correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub value: String,
}

impl From<&AnswerOption> for OptionView {
    fn from(option: &AnswerOption) -> Self {
        Self {
            id: option.id,
            question_id: option.question_id,
            value: option.value.clone(),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    quiz_id: QuizId,
    #[serde(rename = "question")]
    prompt: String,
    options: Vec<AnswerOption>,
}

impl Question {
    /// Rehydrate a question loaded from storage. Options are kept in the given order.
    #[must_use]
    pub fn from_persisted(
        id: QuestionId,
        quiz_id: QuizId,
        prompt: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Self {
        Self {
            id,
            quiz_id,
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Returns the option with the given id if it belongs to this question.
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn has_option(&self, id: OptionId) -> bool {
        self.option(id).is_some()
    }

    #[must_use]
    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            quiz_id: self.quiz_id,
            question: self.prompt.clone(),
            options: self.options.iter().map(OptionView::from).collect(),
        }
    }
}

/// What a quiz taker is allowed to see of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub question: String,
    pub options: Vec<OptionView>,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz with its questions in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    id: QuizId,
    name: String,
    created_at: DateTime<Utc>,
    questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn from_persisted(
        id: QuizId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// First question of the quiz, `None` if the quiz is empty.
    #[must_use]
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            question_count: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        }
    }
}

/// Lightweight listing row for a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: QuizId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub question_count: u32,
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated quiz definition, typically decoded from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(alias = "answers")]
    pub options: Vec<OptionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDraft {
    pub value: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuizDraft {
    /// Validate and normalize the draft into a quiz ready to be persisted.
    ///
    /// Names, prompts and option values are trimmed. A quiz without questions is
    /// accepted; it just cannot be attempted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` when a name, prompt or option value is blank, or a
    /// question carries no options.
    pub fn validate(self, created_at: DateTime<Utc>) -> Result<NewQuiz, QuizError> {
        let name = normalize_quiz_name(&self.name)?;

        let mut questions = Vec::with_capacity(self.questions.len());
        for (index, question) in self.questions.into_iter().enumerate() {
            let prompt = question.prompt.trim().to_owned();
            if prompt.is_empty() {
                return Err(QuizError::EmptyPrompt { index });
            }
            if question.options.is_empty() {
                return Err(QuizError::NoOptions { index });
            }

            let mut options = Vec::with_capacity(question.options.len());
            for (option_index, option) in question.options.into_iter().enumerate() {
                let value = option.value.trim().to_owned();
                if value.is_empty() {
                    return Err(QuizError::EmptyOptionValue {
                        question: index,
                        option: option_index,
                    });
                }
                options.push(NewOption {
                    value,
                    is_correct: option.is_correct,
                });
            }
            questions.push(NewQuestion { prompt, options });
        }

        Ok(NewQuiz {
            name,
            created_at,
            questions,
        })
    }
}

/// A validated quiz that has not been assigned identifiers yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    name: String,
    created_at: DateTime<Utc>,
    questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    prompt: String,
    options: Vec<NewOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOption {
    value: String,
    is_correct: bool,
}

impl NewQuiz {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn questions(&self) -> &[NewQuestion] {
        &self.questions
    }
}

impl NewQuestion {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[NewOption] {
        &self.options
    }
}

impl NewOption {
    /// An option to append to an existing question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyValue` if the trimmed value is empty.
    pub fn new(value: &str, is_correct: bool) -> Result<Self, QuizError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(QuizError::EmptyValue);
        }
        Ok(Self {
            value: value.to_owned(),
            is_correct,
        })
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}
