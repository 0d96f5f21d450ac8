//! Whole-database image export/restore through the SQLite backup API.
//!
//! # Invariants
//! - An image is a complete SQLite database file, header included.
//! - Restore only targets fresh connections; the live one is swapped by the
//!   caller after the restored copy is fully migrated.

use super::{DbError, DbResult};
use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName};
use std::io::Write;

const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// Serializes the full `main` database into an owned byte buffer.
pub fn export_image(conn: &Connection) -> DbResult<Vec<u8>> {
    let target = tempfile::NamedTempFile::new()?;
    conn.backup(DatabaseName::Main, target.path(), None::<fn(Progress)>)?;
    let image = std::fs::read(target.path())?;
    Ok(image)
}

/// Returns whether `image` starts with the SQLite file header.
pub fn is_sqlite_image(image: &[u8]) -> bool {
    image.starts_with(SQLITE_HEADER)
}

pub(super) fn restore_image(conn: &mut Connection, image: &[u8]) -> DbResult<()> {
    if !is_sqlite_image(image) {
        return Err(DbError::InvalidImage(format!(
            "missing sqlite header ({} bytes)",
            image.len()
        )));
    }

    let mut source = tempfile::NamedTempFile::new()?;
    source.write_all(image)?;
    source.flush()?;
    conn.restore(DatabaseName::Main, source.path(), None::<fn(Progress)>)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::is_sqlite_image;

    #[test]
    fn header_check_rejects_arbitrary_bytes() {
        assert!(!is_sqlite_image(b"not a database"));
        assert!(!is_sqlite_image(&[]));
        assert!(is_sqlite_image(b"SQLite format 3\0rest-of-page"));
    }
}
