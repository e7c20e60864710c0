use quiz_core::model::{
    NewAnswer, NewOption, NewProgression, NewScore, NewUser, OptionDraft, OptionId, Page,
    ProgressionId, QuestionDraft, QuestionId, QuizDraft, QuizId, UserFilter, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    AnswerRepository, AttemptPersistence, ProgressionRepository, QuizRepository,
    ScoreRepository, StorageError, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn capitals() -> QuizDraft {
    let question = |prompt: &str, right: &str, wrong: &str| QuestionDraft {
        prompt: prompt.into(),
        options: vec![
            OptionDraft {
                value: right.into(),
                is_correct: true,
            },
            OptionDraft {
                value: wrong.into(),
                is_correct: false,
            },
        ],
    };
    QuizDraft {
        name: "Capitals".into(),
        questions: vec![
            question("France?", "Paris", "Lyon"),
            question("Italy?", "Rome", "Milan"),
        ],
    }
}

#[tokio::test]
async fn sqlite_quiz_round_trip_keeps_order_and_flags() {
    let repo = connect("memdb_quiz_roundtrip").await;
    let stored = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let fetched = repo.get_quiz(stored.id()).await.unwrap().expect("quiz");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.questions()[0].prompt(), "France?");
    assert_eq!(fetched.questions()[1].options()[0].value, "Rome");
    assert!(fetched.questions()[1].options()[0].is_correct);
    assert!(!fetched.questions()[1].options()[1].is_correct);

    let question = repo
        .get_question(fetched.questions()[1].id())
        .await
        .unwrap()
        .expect("question");
    assert_eq!(question, fetched.questions()[1]);

    let listed = repo.list_quizzes(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].question_count, 2);

    let first = fetched.questions()[0].options()[0].id;
    let options = repo
        .find_options(&[first, first, OptionId::new(9_999)])
        .await
        .unwrap();
    assert_eq!(options.len(), 1);
    assert!(repo.find_options(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_attempt_lifecycle_is_transactional() {
    let repo = connect("memdb_attempt_lifecycle").await;
    let user = repo
        .insert_user(NewUser::new("Ada", fixed_now()).unwrap())
        .await
        .unwrap();
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let started = repo
        .create_progression(NewProgression::begin(user.id, &quiz, fixed_now()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        repo.get_progression(started.id()).await.unwrap(),
        Some(started.clone())
    );

    let option = quiz.questions()[0].options()[0].id;
    let mut advanced = started.clone();
    advanced.advance(&quiz, fixed_now()).unwrap();
    repo.record_answer(
        NewAnswer::for_progression(&started, option, fixed_now()),
        &advanced,
        0,
    )
    .await
    .unwrap();

    let stale = repo
        .record_answer(
            NewAnswer::for_progression(&started, option, fixed_now()),
            &advanced,
            0,
        )
        .await
        .unwrap_err();
    assert!(matches!(stale, StorageError::Conflict));
    assert_eq!(repo.find_answers(user.id, quiz.id()).await.unwrap().len(), 1);

    let reloaded = repo.get_progression(started.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.question_number(), 1);
    assert_eq!(reloaded.current_question_id(), quiz.questions()[1].id());

    let score = NewScore::from_chosen_options(
        user.id,
        quiz.id(),
        &[quiz.questions()[0].options()[0].clone()],
        quiz.question_count(),
        fixed_now(),
    )
    .unwrap();
    let stored = repo
        .finalize_attempt(score.clone(), started.id())
        .await
        .unwrap();
    assert!((stored.value - 0.5).abs() < f64::EPSILON);
    assert!(repo.get_progression(started.id()).await.unwrap().is_none());

    let again = repo.finalize_attempt(score, started.id()).await.unwrap_err();
    assert!(matches!(again, StorageError::NotFound));
    assert_eq!(repo.find_scores(quiz.id()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_scores_rank_best_first() {
    let repo = connect("memdb_scores_rank").await;
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let mut users = Vec::new();
    for (name, value) in [("a", 0.5), ("b", 0.9), ("c", 0.5)] {
        let user = repo
            .insert_user(NewUser::new(name, fixed_now()).unwrap())
            .await
            .unwrap();
        repo.create_score(NewScore {
            user_id: user.id,
            quiz_id: quiz.id(),
            value,
            created_at: fixed_now(),
        })
        .await
        .unwrap();
        users.push(user.id);
    }

    let order: Vec<UserId> = repo
        .find_scores(quiz.id())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    assert_eq!(order, vec![users[1], users[0], users[2]]);

    let own = repo.find_score(users[2], quiz.id()).await.unwrap().unwrap();
    assert!((own.value - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn sqlite_deletes_cascade() {
    let repo = connect("memdb_cascade").await;
    let user = repo
        .insert_user(NewUser::new("Ada", fixed_now()).unwrap())
        .await
        .unwrap();
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let progression = repo
        .create_progression(NewProgression::begin(user.id, &quiz, fixed_now()).unwrap())
        .await
        .unwrap();
    repo.create_answer(NewAnswer::for_progression(
        &progression,
        quiz.questions()[0].options()[1].id,
        fixed_now(),
    ))
    .await
    .unwrap();

    assert!(repo.delete_quiz(quiz.id()).await.unwrap());
    assert!(repo.get_quiz(quiz.id()).await.unwrap().is_none());
    assert!(repo.get_progression(progression.id()).await.unwrap().is_none());
    assert!(repo.find_answers(user.id, quiz.id()).await.unwrap().is_empty());
    assert!(!repo.delete_quiz(quiz.id()).await.unwrap());

    assert!(repo.delete_user(user.id).await.unwrap());
    assert!(repo.get_user(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_rejects_dangling_references() {
    let repo = connect("memdb_dangling").await;
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let err = repo
        .create_progression(NewProgression::begin(UserId::new(404), &quiz, fixed_now()).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_progression_save_and_delete() {
    let repo = connect("memdb_progression_save_delete").await;
    let user = repo
        .insert_user(NewUser::new("Ada", fixed_now()).unwrap())
        .await
        .unwrap();
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let mut progression = repo
        .create_progression(NewProgression::begin(user.id, &quiz, fixed_now()).unwrap())
        .await
        .unwrap();

    progression.advance(&quiz, fixed_now()).unwrap();
    repo.save_progression(&progression).await.unwrap();
    let stored = repo
        .get_progression(progression.id())
        .await
        .unwrap()
        .expect("progression");
    assert_eq!(stored, progression);
    assert_eq!(stored.current_question_id(), quiz.questions()[1].id());

    assert!(repo.delete_progression(progression.id()).await.unwrap());
    assert!(!repo.delete_progression(progression.id()).await.unwrap());
    let err = repo.save_progression(&progression).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_ids_beyond_row_range_are_absent() {
    let repo = connect("memdb_oversized_ids").await;
    let user = UserId::new(u64::MAX);
    let quiz = QuizId::new(u64::MAX);

    assert!(repo.get_user(user).await.unwrap().is_none());
    assert!(!repo.delete_user(user).await.unwrap());
    assert!(!repo.rename_user(user, "x").await.unwrap());
    assert!(repo.get_quiz(quiz).await.unwrap().is_none());
    assert!(!repo.delete_quiz(quiz).await.unwrap());
    assert!(
        repo.get_question(QuestionId::new(u64::MAX))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.find_options(&[OptionId::new(u64::MAX)])
            .await
            .unwrap()
            .is_empty()
    );
    let progression = ProgressionId::new(u64::MAX);
    assert!(repo.get_progression(progression).await.unwrap().is_none());
    assert!(!repo.delete_progression(progression).await.unwrap());
    assert!(repo.find_scores(quiz).await.unwrap().is_empty());
    assert!(repo.find_score(user, quiz).await.unwrap().is_none());
    assert!(repo.find_answers(user, quiz).await.unwrap().is_empty());

    let score = NewScore {
        user_id: user,
        quiz_id: quiz,
        value: 1.0,
        created_at: fixed_now(),
    };
    let err = repo
        .finalize_attempt(score.clone(), progression)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    let err = repo.create_score(score).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_users_list_rename_and_filter() {
    let repo = connect("memdb_users_list").await;
    for name in ["Ada", "Grace", "adam", "50%_off"] {
        repo.insert_user(NewUser::new(name, fixed_now()).unwrap())
            .await
            .unwrap();
    }

    let page = repo
        .list_users(&UserFilter::default(), Page::new(2, 2))
        .await
        .unwrap();
    let ids: Vec<u64> = page.iter().map(|u| u.id.value()).collect();
    assert_eq!(ids, vec![3, 4]);

    let by_name = UserFilter {
        ids: Vec::new(),
        name: Some("ada".into()),
    };
    let names: Vec<String> = repo
        .list_users(&by_name, Page::new(1, 10))
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["Ada", "adam"]);

    // LIKE wildcards in the fragment match literally.
    let literal = UserFilter {
        ids: Vec::new(),
        name: Some("%_".into()),
    };
    let users = repo.list_users(&literal, Page::new(1, 10)).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "50%_off");

    let by_ids = UserFilter {
        ids: vec![UserId::new(2), UserId::new(3), UserId::new(u64::MAX)],
        name: Some("a".into()),
    };
    let ids: Vec<u64> = repo
        .list_users(&by_ids, Page::new(1, 10))
        .await
        .unwrap()
        .iter()
        .map(|u| u.id.value())
        .collect();
    assert_eq!(ids, vec![2, 3]);

    let only_unknown = UserFilter {
        ids: vec![UserId::new(u64::MAX)],
        name: None,
    };
    assert!(
        repo.list_users(&only_unknown, Page::new(1, 10))
            .await
            .unwrap()
            .is_empty()
    );

    assert!(repo.rename_user(UserId::new(1), "Countess").await.unwrap());
    let user = repo.get_user(UserId::new(1)).await.unwrap().expect("user");
    assert_eq!(user.name, "Countess");
    assert!(!repo.rename_user(UserId::new(99), "x").await.unwrap());
}

#[tokio::test]
async fn sqlite_quiz_rename_and_added_option() {
    let repo = connect("memdb_quiz_edit").await;
    let quiz = repo
        .insert_quiz(&capitals().validate(fixed_now()).unwrap())
        .await
        .unwrap();

    assert!(repo.rename_quiz(quiz.id(), "World capitals").await.unwrap());
    assert!(!repo.rename_quiz(QuizId::new(99), "x").await.unwrap());

    let question = quiz.questions()[0].id();
    let option = repo
        .insert_option(question, &NewOption::new("Marseille", false).unwrap())
        .await
        .unwrap();

    let fetched = repo.get_quiz(quiz.id()).await.unwrap().expect("quiz");
    assert_eq!(fetched.name(), "World capitals");
    assert_eq!(fetched.questions()[0].options().len(), 3);
    assert_eq!(fetched.questions()[0].options().last(), Some(&option));

    let err = repo
        .insert_option(QuestionId::new(9_999), &NewOption::new("x", true).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
