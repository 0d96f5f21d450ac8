use studydeck_core::{BlobStore, DirBlobStore, MemoryBlobStore, NoteRecord, NoteStore, StorageError};
use tempfile::TempDir;
use uuid::Uuid;

fn put_note(store: &mut dyn BlobStore, note: &NoteRecord) {
    let bytes = serde_json::to_vec(note).unwrap();
    store.put(&format!("note-{}", note.id), &bytes).unwrap();
}

fn note(id: u128, updated_at: i64) -> NoteRecord {
    NoteRecord {
        id: Uuid::from_u128(id),
        title: format!("note {id}"),
        content: String::new(),
        created_at: 1,
        updated_at,
    }
}

#[test]
fn note_crud_in_memory() {
    let mut store = MemoryBlobStore::new();
    let mut notes = NoteStore::new(&mut store);

    let created = notes.create("Groceries", "milk").unwrap();
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(notes.get(created.id).unwrap(), Some(created.clone()));

    let updated = notes.update(created.id, "Groceries", "milk, eggs").unwrap();
    assert_eq!(updated.content, "milk, eggs");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    assert!(notes.delete(created.id).unwrap());
    assert!(!notes.delete(created.id).unwrap());
    assert!(notes.get(created.id).unwrap().is_none());
    assert!(store.is_empty());
}

#[test]
fn update_missing_note_is_not_found() {
    let mut store = MemoryBlobStore::new();
    let err = NoteStore::new(&mut store)
        .update(Uuid::new_v4(), "t", "c")
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn list_by_updated_orders_and_skips_other_keys() {
    let mut store = MemoryBlobStore::new();
    put_note(&mut store, &note(3, 10));
    put_note(&mut store, &note(1, 30));
    put_note(&mut store, &note(2, 10));
    store.put("database_image", b"not json").unwrap();

    let ids: Vec<u128> = NoteStore::new(&mut store)
        .list_by_updated()
        .unwrap()
        .into_iter()
        .map(|note| note.id.as_u128())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn undecodable_note_reports_key() {
    let mut store = MemoryBlobStore::new();
    let id = Uuid::new_v4();
    store.put(&format!("note-{id}"), b"{broken").unwrap();

    let err = NoteStore::new(&mut store).get(id).unwrap_err();
    match err {
        StorageError::Decode { key, .. } => assert_eq!(key, format!("note-{id}")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn notes_survive_directory_store_reopen() {
    let dir = TempDir::new().unwrap();
    let created = {
        let mut store = DirBlobStore::open(dir.path()).unwrap();
        NoteStore::new(&mut store)
            .create("Reading list", "SICP")
            .unwrap()
    };

    let mut store = DirBlobStore::open(dir.path()).unwrap();
    let notes = NoteStore::new(&mut store).list_by_updated().unwrap();
    assert_eq!(notes, vec![created]);
}

#[test]
fn note_store_works_through_trait_objects() {
    let mut store = MemoryBlobStore::new();
    let dyn_store: &mut dyn BlobStore = &mut store;
    let mut notes = NoteStore::new(dyn_store);
    let created = notes.create("dyn", "works").unwrap();
    assert_eq!(notes.list_by_updated().unwrap().len(), 1);
    assert_eq!(notes.get(created.id).unwrap().unwrap().title, "dyn");
}
