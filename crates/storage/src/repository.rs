use async_trait::async_trait;
use quiz_core::model::{
    Answer, AnswerId, AnswerOption, NewAnswer, NewOption, NewProgression, NewQuiz, NewScore,
    NewUser, OptionId, Page, Progression, ProgressionId, Question, QuestionId, Quiz, QuizId,
    QuizSummary, Score, ScoreId, User, UserFilter, UserId,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for quiz takers.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Users matching `filter`, ordered by id, restricted to one page.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, StorageError>;

    /// Returns `false` if no such user existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn rename_user(&self, id: UserId, name: &str) -> Result<bool, StorageError>;

    /// Delete a user together with their answers, scores and attempts.
    /// Returns `false` if no such user existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError>;
}

/// Repository contract for quizzes, their questions and options.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a quiz with all its questions and options atomically.
    ///
    /// Questions and options receive ascending ids in draft order, which is
    /// the order they are returned in afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if anything cannot be stored; nothing is kept then.
    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StorageError>;

    /// Fetch a quiz with its questions and their options.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List quizzes ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizSummary>, StorageError>;

    /// Fetch a single question with its options.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Fetch the distinct options whose ids are in `ids`, ordered by id.
    /// Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_options(&self, ids: &[OptionId]) -> Result<Vec<AnswerOption>, StorageError>;

    /// Returns `false` if no such quiz existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn rename_quiz(&self, id: QuizId, name: &str) -> Result<bool, StorageError>;

    /// Append an option to an existing question. It sorts after the
    /// question's current options.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn insert_option(
        &self,
        question: QuestionId,
        option: &NewOption,
    ) -> Result<AnswerOption, StorageError>;

    /// Delete a quiz and everything that references it.
    /// Returns `false` if no such quiz existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the progression cannot be stored.
    async fn create_progression(
        &self,
        progression: NewProgression,
    ) -> Result<Progression, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progression(
        &self,
        id: ProgressionId,
    ) -> Result<Option<Progression>, StorageError>;

    /// Overwrite the mutable fields of an existing progression.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the progression does not exist.
    async fn save_progression(&self, progression: &Progression) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_progression(&self, id: ProgressionId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the answer cannot be stored.
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError>;

    /// All answers a user gave within a quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_answers(&self, user: UserId, quiz: QuizId)
    -> Result<Vec<Answer>, StorageError>;
}

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the score cannot be stored.
    async fn create_score(&self, score: NewScore) -> Result<Score, StorageError>;

    /// All scores of a quiz, best first. Equal values keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_scores(&self, quiz: QuizId) -> Result<Vec<Score>, StorageError>;

    /// The first score a user obtained for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_score(&self, user: UserId, quiz: QuizId)
    -> Result<Option<Score>, StorageError>;
}

/// Atomic multi-row writes used by the attempt workflow.
#[async_trait]
pub trait AttemptPersistence: Send + Sync {
    /// Insert `answer` and save the already advanced `progression` in one unit.
    ///
    /// The stored progression must still be unfinished and at
    /// `expected_question_number`; otherwise another submission won the race.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the progression is gone and
    /// `StorageError::Conflict` if it moved on since it was read.
    async fn record_answer(
        &self,
        answer: NewAnswer,
        progression: &Progression,
        expected_question_number: u32,
    ) -> Result<Answer, StorageError>;

    /// Insert `score` and delete the progression in one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the progression is already gone.
    async fn finalize_attempt(
        &self,
        score: NewScore,
        progression: ProgressionId,
    ) -> Result<Score, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Sequences {
    user: u64,
    quiz: u64,
    question: u64,
    option: u64,
    progression: u64,
    answer: u64,
    score: u64,
}

fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
struct MemoryState {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    quizzes: BTreeMap<QuizId, Quiz>,
    question_index: BTreeMap<QuestionId, QuizId>,
    progressions: BTreeMap<ProgressionId, Progression>,
    answers: BTreeMap<AnswerId, Answer>,
    scores: BTreeMap<ScoreId, Score>,
    unavailable: bool,
}

impl MemoryState {
    fn insert_answer(&mut self, answer: NewAnswer) -> Answer {
        let id = AnswerId::new(next(&mut self.seq.answer));
        let answer = answer.into_answer(id);
        self.answers.insert(id, answer.clone());
        answer
    }

    fn insert_score(&mut self, score: NewScore) -> Score {
        let id = ScoreId::new(next(&mut self.seq.score));
        let score = score.into_score(id);
        self.scores.insert(id, score.clone());
        score
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All tables live behind one lock, so the composite writes of
/// [`AttemptPersistence`] are atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageError::Connection`.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut guard) = self.state.lock() {
            guard.unavailable = unavailable;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.unavailable {
            return Err(StorageError::Connection("store unavailable".into()));
        }
        Ok(guard)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut guard = self.lock()?;
        let id = UserId::new(next(&mut guard.seq.user));
        let user = user.into_user(id);
        guard.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, StorageError> {
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.size).unwrap_or(usize::MAX);
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|u| filter.matches(u))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn rename_user(&self, id: UserId, name: &str) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        let Some(user) = guard.users.get_mut(&id) else {
            return Ok(false);
        };
        name.clone_into(&mut user.name);
        Ok(true)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        if guard.users.remove(&id).is_none() {
            return Ok(false);
        }
        guard.answers.retain(|_, a| a.user_id != id);
        guard.scores.retain(|_, s| s.user_id != id);
        guard.progressions.retain(|_, p| p.user_id() != id);
        Ok(true)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StorageError> {
        let mut guard = self.lock()?;
        let quiz_id = QuizId::new(next(&mut guard.seq.quiz));

        let mut questions = Vec::with_capacity(quiz.questions().len());
        for draft in quiz.questions() {
            let question_id = QuestionId::new(next(&mut guard.seq.question));
            let mut options = Vec::with_capacity(draft.options().len());
            for option in draft.options() {
                options.push(AnswerOption {
                    id: OptionId::new(next(&mut guard.seq.option)),
                    question_id,
                    value: option.value().to_owned(),
                    is_correct: option.is_correct(),
                });
            }
            guard.question_index.insert(question_id, quiz_id);
            questions.push(Question::from_persisted(
                question_id,
                quiz_id,
                draft.prompt(),
                options,
            ));
        }

        let stored = Quiz::from_persisted(quiz_id, quiz.name(), quiz.created_at(), questions);
        guard.quizzes.insert(quiz_id, stored.clone());
        Ok(stored)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizSummary>, StorageError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .lock()?
            .quizzes
            .values()
            .take(limit)
            .map(Quiz::summary)
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.lock()?;
        let question = guard
            .question_index
            .get(&id)
            .and_then(|quiz_id| guard.quizzes.get(quiz_id))
            .and_then(|quiz| quiz.questions().iter().find(|q| q.id() == id))
            .cloned();
        Ok(question)
    }

    async fn find_options(&self, ids: &[OptionId]) -> Result<Vec<AnswerOption>, StorageError> {
        let wanted: HashSet<OptionId> = ids.iter().copied().collect();
        let guard = self.lock()?;
        let mut found: Vec<AnswerOption> = guard
            .quizzes
            .values()
            .flat_map(|quiz| quiz.questions().iter())
            .flat_map(|question| question.options().iter())
            .filter(|option| wanted.contains(&option.id))
            .cloned()
            .collect();
        found.sort_by_key(|o| o.id);
        Ok(found)
    }

    async fn rename_quiz(&self, id: QuizId, name: &str) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        let Some(quiz) = guard.quizzes.get_mut(&id) else {
            return Ok(false);
        };
        *quiz = Quiz::from_persisted(id, name, quiz.created_at(), quiz.questions().to_vec());
        Ok(true)
    }

    async fn insert_option(
        &self,
        question: QuestionId,
        option: &NewOption,
    ) -> Result<AnswerOption, StorageError> {
        let mut guard = self.lock()?;
        let quiz_id = *guard
            .question_index
            .get(&question)
            .ok_or(StorageError::NotFound)?;
        let stored = AnswerOption {
            id: OptionId::new(next(&mut guard.seq.option)),
            question_id: question,
            value: option.value().to_owned(),
            is_correct: option.is_correct(),
        };

        let quiz = guard.quizzes.get_mut(&quiz_id).ok_or(StorageError::NotFound)?;
        let questions = quiz
            .questions()
            .iter()
            .map(|q| {
                if q.id() != question {
                    return q.clone();
                }
                let mut options = q.options().to_vec();
                options.push(stored.clone());
                Question::from_persisted(q.id(), quiz_id, q.prompt(), options)
            })
            .collect();
        *quiz = Quiz::from_persisted(quiz_id, quiz.name(), quiz.created_at(), questions);
        Ok(stored)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        if guard.quizzes.remove(&id).is_none() {
            return Ok(false);
        }
        guard.question_index.retain(|_, quiz_id| *quiz_id != id);
        guard.progressions.retain(|_, p| p.quiz_id() != id);
        guard.answers.retain(|_, a| a.quiz_id != id);
        guard.scores.retain(|_, s| s.quiz_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ProgressionRepository for InMemoryRepository {
    async fn create_progression(
        &self,
        progression: NewProgression,
    ) -> Result<Progression, StorageError> {
        let mut guard = self.lock()?;
        let id = ProgressionId::new(next(&mut guard.seq.progression));
        let stored = Progression::started(id, &progression);
        guard.progressions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_progression(
        &self,
        id: ProgressionId,
    ) -> Result<Option<Progression>, StorageError> {
        Ok(self.lock()?.progressions.get(&id).cloned())
    }

    async fn save_progression(&self, progression: &Progression) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .progressions
            .get_mut(&progression.id())
            .ok_or(StorageError::NotFound)?;
        *slot = progression.clone();
        Ok(())
    }

    async fn delete_progression(&self, id: ProgressionId) -> Result<bool, StorageError> {
        Ok(self.lock()?.progressions.remove(&id).is_some())
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError> {
        Ok(self.lock()?.insert_answer(answer))
    }

    async fn find_answers(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Vec<Answer>, StorageError> {
        Ok(self
            .lock()?
            .answers
            .values()
            .filter(|a| a.user_id == user && a.quiz_id == quiz)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn create_score(&self, score: NewScore) -> Result<Score, StorageError> {
        Ok(self.lock()?.insert_score(score))
    }

    async fn find_scores(&self, quiz: QuizId) -> Result<Vec<Score>, StorageError> {
        let mut scores: Vec<Score> = self
            .lock()?
            .scores
            .values()
            .filter(|s| s.quiz_id == quiz)
            .cloned()
            .collect();
        // BTreeMap iteration is by id, and the sort is stable.
        scores.sort_by(|a, b| b.value.total_cmp(&a.value));
        Ok(scores)
    }

    async fn find_score(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Option<Score>, StorageError> {
        Ok(self
            .lock()?
            .scores
            .values()
            .find(|s| s.user_id == user && s.quiz_id == quiz)
            .cloned())
    }
}

#[async_trait]
impl AttemptPersistence for InMemoryRepository {
    async fn record_answer(
        &self,
        answer: NewAnswer,
        progression: &Progression,
        expected_question_number: u32,
    ) -> Result<Answer, StorageError> {
        let mut guard = self.lock()?;
        let stored = guard
            .progressions
            .get(&progression.id())
            .ok_or(StorageError::NotFound)?;
        if stored.is_finished() || stored.question_number() != expected_question_number {
            return Err(StorageError::Conflict);
        }

        let answer = guard.insert_answer(answer);
        guard
            .progressions
            .insert(progression.id(), progression.clone());
        Ok(answer)
    }

    async fn finalize_attempt(
        &self,
        score: NewScore,
        progression: ProgressionId,
    ) -> Result<Score, StorageError> {
        let mut guard = self.lock()?;
        if guard.progressions.remove(&progression).is_none() {
            return Err(StorageError::NotFound);
        }
        Ok(guard.insert_score(score))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub progressions: Arc<dyn ProgressionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub scores: Arc<dyn ScoreRepository>,
    pub attempts: Arc<dyn AttemptPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wire every repository handle to the same backend.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: UserRepository
            + QuizRepository
            + ProgressionRepository
            + AnswerRepository
            + ScoreRepository
            + AttemptPersistence
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            progressions: Arc::new(repo.clone()),
            answers: Arc::new(repo.clone()),
            scores: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}
