//! Key-value blob storage underneath the relational image.
//!
//! # Responsibility
//! - Define the byte-oriented `BlobStore` contract used for the database
//!   image, the legacy flat store and the notes collection.
//! - Provide in-memory and directory-backed implementations.
//!
//! # Invariants
//! - Keys are opaque to callers; implementations may restrict their shape.
//! - `put` fully replaces the value stored under a key.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod dir;
mod memory;
pub mod notes;

pub use dir::DirBlobStore;
pub use memory::MemoryBlobStore;
pub use notes::{NoteId, NoteRecord, NoteStore};

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by blob store implementations.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying file-system failure.
    Io(std::io::Error),
    /// Key cannot be represented by this store.
    InvalidKey(String),
    /// Stored bytes do not decode into the expected record.
    Decode { key: String, message: String },
    /// Record addressed by key does not exist.
    NotFound(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "blob store io failed: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid blob store key: `{key}`"),
            Self::Decode { key, message } => {
                write!(f, "cannot decode value stored at `{key}`: {message}")
            }
            Self::NotFound(key) => write!(f, "blob store key not found: `{key}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Byte-oriented key-value store.
///
/// Object safe, so a legacy store can be handed over as `&mut dyn BlobStore`.
pub trait BlobStore {
    /// Loads the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()>;
    /// Removes `key`. Returns whether a value existed.
    fn delete(&mut self, key: &str) -> StorageResult<bool>;
    /// Returns all keys in ascending order.
    fn keys(&self) -> StorageResult<Vec<String>>;
}
