use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rusqlite::types::Value;
use studydeck_core::{
    BlobStore, DirBlobStore, MemoryBlobStore, NewSingleAnswerQuestion, QuestionKey, SessionError,
    SessionSlot, SingleAnswerService, StudySession, TagService, DATABASE_IMAGE_KEY,
    LEGACY_IMAGE_KEY,
};

fn fresh_session() -> StudySession<MemoryBlobStore> {
    StudySession::initialize(MemoryBlobStore::new(), None).unwrap()
}

#[test]
fn fresh_session_does_not_write_until_first_mutation() {
    let mut session = fresh_session();
    assert!(session.store().get(DATABASE_IMAGE_KEY).unwrap().is_none());

    SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion::new("2+3?", "5"))
        .unwrap();
    assert!(session.store().get(DATABASE_IMAGE_KEY).unwrap().is_some());
}

#[test]
fn query_returns_rows_keyed_by_alias_and_empty_when_nothing_matches() {
    let session = fresh_session();

    let rows = session
        .query(
            "SELECT type_code AS code, description FROM question_types WHERE type_code = ?1;",
            ["single_answer"],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["code"], Value::Text("single_answer".to_string()));
    assert!(rows[0].contains_key("description"));

    let none = session
        .query(
            "SELECT * FROM questions WHERE question_id = ?1;",
            ["missing"],
        )
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn run_and_persist_writes_image_after_each_statement() {
    let mut session = fresh_session();
    let changed = session
        .run_and_persist(
            "INSERT INTO tags (tag_id, tag_name) VALUES (?1, ?2);",
            ["8f14e45f-ceea-4e67-a4c1-2b0d9a2f5c11", "raw"],
        )
        .unwrap();
    assert_eq!(changed, 1);

    let store = session.into_store();
    let reopened = StudySession::initialize(store, None).unwrap();
    let rows = reopened
        .query("SELECT tag_name FROM tags;", [])
        .unwrap();
    assert_eq!(rows[0]["tag_name"], Value::Text("raw".to_string()));
}

#[test]
fn reinitializing_from_store_restores_questions() {
    let mut session = fresh_session();
    let question_id = SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion::new("Largest planet?", "Jupiter"))
        .unwrap();

    let mut reopened = StudySession::initialize(session.into_store(), None).unwrap();
    let loaded = SingleAnswerService::new(&mut reopened)
        .get(question_id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.correct_answer, "Jupiter");
}

#[test]
fn failed_write_rolls_back_and_is_not_persisted() {
    let mut session = fresh_session();
    let question_id = SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion::new("q", "a"))
        .unwrap();
    let before = session.store().get(DATABASE_IMAGE_KEY).unwrap();

    let result = session.write(|tx| -> Result<(), SessionError> {
        tx.execute(
            "UPDATE questions SET difficulty = 4 WHERE question_id = ?1;",
            [question_id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO questions (question_id, question_type) VALUES ('x', 'essay');",
            [],
        )?;
        Ok(())
    });
    assert!(result.is_err());

    let rows = session
        .query(
            "SELECT difficulty FROM questions WHERE question_id = ?1;",
            [question_id.to_string()],
        )
        .unwrap();
    assert_eq!(rows[0]["difficulty"], Value::Integer(1));
    assert_eq!(session.store().get(DATABASE_IMAGE_KEY).unwrap(), before);
}

#[test]
fn import_of_exported_image_reproduces_every_table() {
    let mut session = fresh_session();
    let question_id = SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion {
            tags: vec!["space".to_string()],
            ..NewSingleAnswerQuestion::new("Closest star?", "Sun")
        })
        .unwrap();
    let tables = [
        "question_types",
        "questions",
        "tags",
        "question_tags",
        "single_answer_questions",
        "single_answer_config",
        "multi_choice_questions",
        "multi_choice_options",
    ];
    let snapshot = |session: &StudySession<MemoryBlobStore>| {
        tables
            .iter()
            .map(|table| {
                session
                    .query(&format!("SELECT * FROM {table} ORDER BY 1, 2;"), [])
                    .unwrap()
            })
            .collect::<Vec<_>>()
    };

    let before = snapshot(&session);
    let image = session.export_image().unwrap();

    SingleAnswerService::new(&mut session)
        .delete(question_id)
        .unwrap();
    assert_ne!(snapshot(&session), before);

    session.import_image(&image).unwrap();
    assert_eq!(snapshot(&session), before);
}

#[test]
fn rejected_import_keeps_live_database() {
    let mut session = fresh_session();
    let question_id = SingleAnswerService::new(&mut session)
        .create(&NewSingleAnswerQuestion::new("q", "a"))
        .unwrap();

    let err = session.import_image(b"garbage").unwrap_err();
    assert!(matches!(err, SessionError::Db(_)));
    assert!(SingleAnswerService::new(&mut session)
        .get(question_id)
        .unwrap()
        .is_some());
}

#[test]
fn legacy_image_is_migrated_once_and_removed() {
    let mut seed = fresh_session();
    let question_id = SingleAnswerService::new(&mut seed)
        .create(&NewSingleAnswerQuestion::new("Legacy?", "yes"))
        .unwrap();
    let image = seed.export_image().unwrap();

    let mut legacy = MemoryBlobStore::new();
    legacy
        .put(LEGACY_IMAGE_KEY, STANDARD.encode(&image).as_bytes())
        .unwrap();

    let mut session =
        StudySession::initialize(MemoryBlobStore::new(), Some(&mut legacy)).unwrap();
    assert!(legacy.get(LEGACY_IMAGE_KEY).unwrap().is_none());
    assert!(session.store().get(DATABASE_IMAGE_KEY).unwrap().is_some());
    assert!(SingleAnswerService::new(&mut session)
        .get(question_id)
        .unwrap()
        .is_some());
}

#[test]
fn legacy_image_never_overwrites_existing_store_image() {
    let mut current = fresh_session();
    TagService::new(&mut current)
        .get_or_create("current")
        .unwrap();
    let store = current.into_store();

    let mut legacy = MemoryBlobStore::new();
    legacy.put(LEGACY_IMAGE_KEY, b"bm90LWFuLWltYWdl").unwrap();

    let mut session = StudySession::initialize(store, Some(&mut legacy)).unwrap();
    assert!(legacy.is_empty());
    let names: Vec<String> = TagService::new(&mut session)
        .list_all()
        .unwrap()
        .into_iter()
        .map(|tag| tag.tag_name)
        .collect();
    assert_eq!(names, vec!["current".to_string()]);
}

#[test]
fn undecodable_legacy_value_fails_initialization() {
    let mut legacy = MemoryBlobStore::new();
    legacy.put(LEGACY_IMAGE_KEY, b"*** not base64 ***").unwrap();

    let err = StudySession::initialize(MemoryBlobStore::new(), Some(&mut legacy))
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::LegacyImage(_)));
    assert!(legacy.get(LEGACY_IMAGE_KEY).unwrap().is_some());
}

#[test]
fn legacy_value_that_is_not_a_database_keeps_both_stores() {
    let dir = tempfile::tempdir().unwrap();
    let mut legacy = MemoryBlobStore::new();
    let encoded = STANDARD.encode(b"truncated-not-sqlite");
    legacy.put(LEGACY_IMAGE_KEY, encoded.as_bytes()).unwrap();

    let store = DirBlobStore::open(dir.path()).unwrap();
    let err = StudySession::initialize(store, Some(&mut legacy))
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::LegacyImage(_)));
    assert_eq!(
        legacy.get(LEGACY_IMAGE_KEY).unwrap(),
        Some(encoded.into_bytes())
    );

    let store = DirBlobStore::open(dir.path()).unwrap();
    assert!(store.get(DATABASE_IMAGE_KEY).unwrap().is_none());
    let session = StudySession::initialize(store, None).unwrap();
    let tags = session.query("SELECT tag_id FROM tags;", []).unwrap();
    assert!(tags.is_empty());
}

#[test]
fn corrupt_stored_image_is_an_initialization_error() {
    let mut store = MemoryBlobStore::new();
    store.put(DATABASE_IMAGE_KEY, b"corrupt").unwrap();

    let err = StudySession::initialize(store, None).err().unwrap();
    assert!(matches!(err, SessionError::Initialization(_)));
}

#[test]
fn generated_identifiers_are_uuid_v4_shaped() {
    let session = fresh_session();
    let first = session.generate_identifier();
    let second = session.generate_identifier();

    assert_ne!(first, second);
    for id in [&first, &second] {
        assert_eq!(id.len(), 36);
        for position in [8, 13, 18, 23] {
            assert_eq!(id.as_bytes()[position], b'-');
        }
        assert_eq!(id.as_bytes()[14], b'4');
        assert!(matches!(id.as_bytes()[19], b'8' | b'9' | b'a' | b'b'));
    }
}

#[test]
fn session_slot_requires_initialize_before_handle() {
    let mut slot = SessionSlot::new(MemoryBlobStore::new());
    assert!(matches!(slot.handle(), Err(SessionError::NotInitialized)));
    assert!(!slot.is_initialized());

    let question_id = {
        let session = slot.initialize(None).unwrap();
        SingleAnswerService::new(session)
            .create(&NewSingleAnswerQuestion::new("q", "a"))
            .unwrap()
    };

    // Second initialize returns the same live session.
    let session = slot.initialize(None).unwrap();
    let key = QuestionKey::single_answer(question_id);
    let tags = TagService::new(session).list_for_question(key).unwrap();
    assert!(tags.is_empty());
    assert!(slot.handle().is_ok());
}

#[test]
fn dir_blob_store_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let question_id = {
        let store = DirBlobStore::open(dir.path()).unwrap();
        let mut session = StudySession::initialize(store, None).unwrap();
        SingleAnswerService::new(&mut session)
            .create(&NewSingleAnswerQuestion::new("On disk?", "yes"))
            .unwrap()
    };

    let store = DirBlobStore::open(dir.path()).unwrap();
    assert_eq!(store.keys().unwrap(), vec![DATABASE_IMAGE_KEY.to_string()]);
    let mut session = StudySession::initialize(store, None).unwrap();
    assert!(SingleAnswerService::new(&mut session)
        .get(question_id)
        .unwrap()
        .is_some());
}
