//! Directory-backed blob store.
//!
//! # Invariants
//! - One regular file per key, named exactly like the key.
//! - Keys match `[A-Za-z0-9_.-]{1,128}` and never start with `.`.
//! - Writes land in a hidden `.<key>.tmp` sibling first and are renamed into
//!   place. Staging names are never valid keys.

use super::{BlobStore, StorageError, StorageResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]{0,127}$").expect("valid key regex"));

const STAGING_PREFIX: &str = ".";
const STAGING_SUFFIX: &str = ".tmp";

/// Blob store persisting each key as a file under one directory.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Opens (and creates when missing) the store directory.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        debug!(
            "event=blob_store_open module=storage status=ok root={}",
            root.display()
        );
        Ok(Self { root })
    }

    /// Directory holding the stored files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for DirBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let staging_name = format!("{STAGING_PREFIX}{key}{STAGING_SUFFIX}");
        let staging = self.root.join(staging_name);
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_key(&name) {
                continue;
            }
            keys.push(name);
        }
        keys.sort();
        Ok(keys)
    }
}

fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_key, DirBlobStore};
    use crate::storage::BlobStore;

    #[test]
    fn key_validation_accepts_plain_names() {
        assert!(is_valid_key("database_image"));
        assert!(is_valid_key("note-0b7c9a1e-2f7d-4c55-9f43-3a0f0c1c2d3e"));
    }

    #[test]
    fn key_validation_rejects_paths_and_hidden_names() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../escape"));
        assert!(!is_valid_key("nested/key"));
        assert!(!is_valid_key(".hidden"));
        assert!(!is_valid_key(&"k".repeat(129)));
    }

    #[test]
    fn keys_with_tmp_suffix_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirBlobStore::open(dir.path()).unwrap();
        store.put("draft.tmp", b"kept").unwrap();
        store.put("database_image", b"image").unwrap();

        assert_eq!(
            store.keys().unwrap(),
            vec!["database_image".to_string(), "draft.tmp".to_string()]
        );
        assert_eq!(store.get("draft.tmp").unwrap(), Some(b"kept".to_vec()));
        assert!(store.delete("draft.tmp").unwrap());
    }

    #[test]
    fn staging_files_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirBlobStore::open(dir.path()).unwrap();
        store.put("notes", b"v1").unwrap();
        std::fs::write(dir.path().join(".notes.tmp"), b"half-written").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["notes".to_string()]);
        assert_eq!(store.get("notes").unwrap(), Some(b"v1".to_vec()));
    }
}
