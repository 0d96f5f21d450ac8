//! Free-form note records kept directly in the blob store.
//!
//! # Responsibility
//! - Store notes as JSON values under `note-<id>` keys.
//! - Provide the "most recently updated first" listing used by note views.
//!
//! # Invariants
//! - Notes never touch the relational database image.
//! - `updated_at >= created_at` for every stored note.

use super::{BlobStore, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const NOTE_KEY_PREFIX: &str = "note-";

/// Stable note identifier.
pub type NoteId = Uuid;

/// Persisted note value. Field names follow the stored JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds; listing order key.
    pub updated_at: i64,
}

/// Note collection view over a blob store.
pub struct NoteStore<'store, S: BlobStore + ?Sized> {
    store: &'store mut S,
}

impl<'store, S: BlobStore + ?Sized> NoteStore<'store, S> {
    pub fn new(store: &'store mut S) -> Self {
        Self { store }
    }

    /// Creates and stores a new note.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StorageResult<NoteRecord> {
        let now = now_epoch_ms();
        let note = NoteRecord {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        };
        self.write(&note)?;
        Ok(note)
    }

    /// Gets one note by id; `None` when absent.
    pub fn get(&self, id: NoteId) -> StorageResult<Option<NoteRecord>> {
        let key = note_key(id);
        match self.store.get(&key)? {
            Some(bytes) => decode_note(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Replaces title and content of an existing note.
    pub fn update(
        &mut self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StorageResult<NoteRecord> {
        let mut note = self
            .get(id)?
            .ok_or_else(|| StorageError::NotFound(note_key(id)))?;
        note.title = title.into();
        note.content = content.into();
        note.updated_at = now_epoch_ms().max(note.created_at);
        self.write(&note)?;
        Ok(note)
    }

    /// Deletes one note. Returns whether it existed.
    pub fn delete(&mut self, id: NoteId) -> StorageResult<bool> {
        self.store.delete(&note_key(id))
    }

    /// Lists notes by `updated_at DESC, id ASC`.
    pub fn list_by_updated(&self) -> StorageResult<Vec<NoteRecord>> {
        let mut notes = Vec::new();
        for key in self.store.keys()? {
            if !key.starts_with(NOTE_KEY_PREFIX) {
                continue;
            }
            if let Some(bytes) = self.store.get(&key)? {
                notes.push(decode_note(&key, &bytes)?);
            }
        }
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    fn write(&mut self, note: &NoteRecord) -> StorageResult<()> {
        let key = note_key(note.id);
        let bytes = serde_json::to_vec(note).map_err(|err| StorageError::Decode {
            key: key.clone(),
            message: err.to_string(),
        })?;
        self.store.put(&key, &bytes)
    }
}

fn note_key(id: NoteId) -> String {
    format!("{NOTE_KEY_PREFIX}{id}")
}

fn decode_note(key: &str, bytes: &[u8]) -> StorageResult<NoteRecord> {
    serde_json::from_slice(bytes).map_err(|err| StorageError::Decode {
        key: key.to_string(),
        message: err.to_string(),
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
