//! SQLite storage bootstrap, schema migrations and database images.
//!
//! # Responsibility
//! - Open and configure the in-memory SQLite connection used by a session.
//! - Apply schema migrations in deterministic order.
//! - Convert the live database to and from a portable binary image.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Every returned connection has `foreign_keys=ON`; cascades depend on it.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod image;
pub mod migrations;
mod open;

pub use image::{export_image, is_sqlite_image};
pub use open::{open_db_from_image, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Temporary file handling around image export/import failed.
    Io(std::io::Error),
    /// Bytes handed to import are not a SQLite database image.
    InvalidImage(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Schema is current but `question_types` lacks a known code.
    UnregisteredQuestionType(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "database image io failed: {err}"),
            Self::InvalidImage(message) => write!(f, "invalid database image: {message}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnregisteredQuestionType(code) => {
                write!(f, "question type `{code}` is missing from question_types")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidImage(_) => None,
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::UnregisteredQuestionType(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
