//! Repository layer: SQL for each table family.
//!
//! # Responsibility
//! - Keep SQL details for the shared core, tags and each question type
//!   behind small repository contracts.
//! - Decode stored rows into typed read models, rejecting corrupt data.
//!
//! # Invariants
//! - Question-type repositories only touch their own tables plus the shared
//!   `questions` core.
//! - Only the tag repository inserts into `tags`.
//! - Repositories never commit or persist; callers own the transaction.

use crate::db::DbError;
use crate::model::question::Difficulty;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod multi_choice_repo;
pub mod question_repo;
pub mod single_answer_repo;
pub mod tag_repo;

/// SQL expression for the current time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for question and tag persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_difficulty(value: i64) -> RepoResult<Difficulty> {
    Difficulty::new(value)
        .map_err(|err| RepoError::InvalidData(format!("questions.difficulty: {err}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
