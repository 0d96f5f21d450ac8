use studydeck_core::{
    MemoryBlobStore, MultiChoiceInput, MultiChoiceService, NewChoiceOption, NewSingleAnswerQuestion,
    Question, QuestionKey, QuestionRecord, QuestionService, QuestionType, SingleAnswerService,
    StudySession,
};
use uuid::Uuid;

fn setup() -> StudySession<MemoryBlobStore> {
    StudySession::initialize(MemoryBlobStore::new(), None).unwrap()
}

fn seed(session: &mut StudySession<MemoryBlobStore>) -> (QuestionKey, QuestionKey) {
    let single = SingleAnswerService::new(session)
        .create(&NewSingleAnswerQuestion {
            tags: vec!["shared".to_string()],
            ..NewSingleAnswerQuestion::new("Capital of Spain?", "Madrid")
        })
        .unwrap();
    let multi = MultiChoiceService::new(session)
        .create(&MultiChoiceInput {
            tags: vec!["shared".to_string(), "oceans".to_string()],
            ..MultiChoiceInput::new(
                "Largest ocean?",
                vec![
                    NewChoiceOption::new("Pacific", true),
                    NewChoiceOption::new("Indian", false),
                ],
            )
        })
        .unwrap();
    (
        QuestionKey::single_answer(single),
        QuestionKey::multi_choice(multi),
    )
}

fn set_updated_at(session: &StudySession<MemoryBlobStore>, key: QuestionKey, value: i64) {
    session
        .connection()
        .execute(
            "UPDATE questions SET updated_at = ?1 WHERE question_id = ?2 AND question_type = ?3;",
            rusqlite::params![
                value,
                key.question_id.to_string(),
                key.question_type.as_code()
            ],
        )
        .unwrap();
}

#[test]
fn get_dispatches_on_question_type() {
    let mut session = setup();
    let (single, multi) = seed(&mut session);
    let service = QuestionService::new(&mut session);

    match service.get(single).unwrap() {
        Some(Question::SingleAnswer(question)) => assert_eq!(question.correct_answer, "Madrid"),
        other => panic!("unexpected question: {other:?}"),
    }
    match service.get(multi).unwrap() {
        Some(Question::MultiChoice(question)) => assert_eq!(question.options.len(), 2),
        other => panic!("unexpected question: {other:?}"),
    }

    // Same id under the other type is a different key.
    let swapped = QuestionKey::multi_choice(single.question_id);
    assert!(service.get(swapped).unwrap().is_none());
}

#[test]
fn list_all_merges_types_by_recency() {
    let mut session = setup();
    let (single, multi) = seed(&mut session);
    set_updated_at(&session, single, 500);
    set_updated_at(&session, multi, 100);

    let listed: Vec<QuestionKey> = QuestionService::new(&mut session)
        .list_all()
        .unwrap()
        .iter()
        .map(QuestionRecord::key)
        .collect();
    assert_eq!(listed, vec![single, multi]);

    set_updated_at(&session, multi, 900);
    let listed = QuestionService::new(&mut session).list_all().unwrap();
    assert_eq!(listed[0].key(), multi);
}

#[test]
fn list_by_tag_uses_exact_names() {
    let mut session = setup();
    let (single, multi) = seed(&mut session);
    let service = QuestionService::new(&mut session);

    let shared: Vec<QuestionKey> = service
        .list_by_tag("shared")
        .unwrap()
        .iter()
        .map(QuestionRecord::key)
        .collect();
    assert_eq!(shared.len(), 2);
    assert!(shared.contains(&single) && shared.contains(&multi));

    let oceans = service.list_by_tag(" oceans ").unwrap();
    assert_eq!(oceans.len(), 1);
    assert_eq!(oceans[0].question_type(), QuestionType::MultiChoice);

    assert!(service.list_by_tag("Oceans").unwrap().is_empty());
    assert!(service.list_by_tag("   ").unwrap().is_empty());
}

#[test]
fn count_by_type_reports_zero_for_empty_types() {
    let mut session = setup();
    let counts = QuestionService::new(&mut session).count_by_type().unwrap();
    assert_eq!(counts[&QuestionType::SingleAnswer], 0);
    assert_eq!(counts[&QuestionType::MultiChoice], 0);

    seed(&mut session);
    SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion::new("1 + 1?", "2"))
        .unwrap();
    let counts = QuestionService::new(&mut session).count_by_type().unwrap();
    assert_eq!(counts[&QuestionType::SingleAnswer], 2);
    assert_eq!(counts[&QuestionType::MultiChoice], 1);
}

#[test]
fn list_question_types_returns_registry() {
    let mut session = setup();
    let types = QuestionService::new(&mut session)
        .list_question_types()
        .unwrap();
    let codes: Vec<&str> = types.iter().map(|info| info.type_code.as_str()).collect();
    assert_eq!(codes, vec!["multi_choice", "single_answer"]);
    assert!(types.iter().all(|info| !info.description.is_empty()));
}

#[test]
fn delete_by_key_removes_only_that_question() {
    let mut session = setup();
    let (single, multi) = seed(&mut session);
    let mut service = QuestionService::new(&mut session);

    assert!(service.delete(multi).unwrap());
    assert!(!service.delete(multi).unwrap());
    assert!(!service
        .delete(QuestionKey::single_answer(Uuid::new_v4()))
        .unwrap());

    let remaining: Vec<QuestionKey> = service
        .list_all()
        .unwrap()
        .iter()
        .map(QuestionRecord::key)
        .collect();
    assert_eq!(remaining, vec![single]);
    assert_eq!(
        session
            .query("SELECT option_id FROM multi_choice_options;", [])
            .unwrap()
            .len(),
        0
    );
}
