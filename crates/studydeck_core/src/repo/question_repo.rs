//! Shared `questions` core and type registry access.
//!
//! # Invariants
//! - Deleting a core row is the only delete path for any question; foreign
//!   keys cascade to type tables, options and tag links.
//! - `touch` always bumps `updated_at`.

use crate::model::question::{Difficulty, QuestionId, QuestionKey, QuestionType, QuestionTypeInfo};
use crate::repo::{parse_uuid, RepoError, RepoResult, NOW_MS_SQL};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Repository interface for the cross-type question core.
pub trait QuestionRepository {
    /// Inserts the core row for a new question.
    fn insert_core(&self, key: QuestionKey, difficulty: Difficulty) -> RepoResult<()>;
    /// Bumps `updated_at` and optionally sets difficulty. Returns whether the
    /// question exists.
    fn touch(&self, key: QuestionKey, difficulty: Option<Difficulty>) -> RepoResult<bool>;
    fn exists(&self, key: QuestionKey) -> RepoResult<bool>;
    /// Deletes the core row. Returns whether it existed.
    fn delete(&self, key: QuestionKey) -> RepoResult<bool>;
    /// Keys of questions linked to the tag named exactly `tag_name`.
    fn keys_with_tag(&self, tag_name: &str) -> RepoResult<Vec<QuestionKey>>;
    /// Number of questions per registered type; absent types count 0.
    fn count_by_type(&self) -> RepoResult<BTreeMap<QuestionType, u64>>;
    fn list_question_types(&self) -> RepoResult<Vec<QuestionTypeInfo>>;
}

/// SQLite-backed question core repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn insert_core(&self, key: QuestionKey, difficulty: Difficulty) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO questions (question_id, question_type, difficulty)
             VALUES (?1, ?2, ?3);",
            params![
                key.question_id.to_string(),
                key.question_type.as_code(),
                i64::from(difficulty),
            ],
        )?;
        Ok(())
    }

    fn touch(&self, key: QuestionKey, difficulty: Option<Difficulty>) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE questions
                 SET
                    difficulty = COALESCE(?3, difficulty),
                    updated_at = {NOW_MS_SQL}
                 WHERE question_id = ?1
                   AND question_type = ?2;"
            ),
            params![
                key.question_id.to_string(),
                key.question_type.as_code(),
                difficulty.map(i64::from),
            ],
        )?;
        Ok(changed > 0)
    }

    fn exists(&self, key: QuestionKey) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM questions
                WHERE question_id = ?1
                  AND question_type = ?2
            );",
            params![key.question_id.to_string(), key.question_type.as_code()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete(&self, key: QuestionKey) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM questions WHERE question_id = ?1 AND question_type = ?2;",
            params![key.question_id.to_string(), key.question_type.as_code()],
        )?;
        Ok(changed > 0)
    }

    fn keys_with_tag(&self, tag_name: &str) -> RepoResult<Vec<QuestionKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT qt.question_id, qt.question_type
             FROM question_tags qt
             INNER JOIN tags t ON t.tag_id = qt.tag_id
             WHERE t.tag_name = ?1
             ORDER BY qt.question_type ASC, qt.question_id ASC;",
        )?;
        let mut rows = stmt.query([tag_name])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("question_id")?;
            let type_text: String = row.get("question_type")?;
            keys.push(QuestionKey::new(
                parse_question_id(&id_text)?,
                parse_question_type(&type_text)?,
            ));
        }
        Ok(keys)
    }

    fn count_by_type(&self) -> RepoResult<BTreeMap<QuestionType, u64>> {
        let mut counts: BTreeMap<QuestionType, u64> =
            QuestionType::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut stmt = self.conn.prepare(
            "SELECT question_type, COUNT(*) AS total
             FROM questions
             GROUP BY question_type;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let type_text: String = row.get("question_type")?;
            let total: i64 = row.get("total")?;
            counts.insert(parse_question_type(&type_text)?, total.max(0) as u64);
        }
        Ok(counts)
    }

    fn list_question_types(&self) -> RepoResult<Vec<QuestionTypeInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT type_code, description
             FROM question_types
             ORDER BY type_code ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(QuestionTypeInfo {
                type_code: row.get("type_code")?,
                description: row.get("description")?,
            });
        }
        Ok(types)
    }
}

pub(crate) fn parse_question_id(value: &str) -> RepoResult<QuestionId> {
    parse_uuid(value, "questions.question_id")
}

fn parse_question_type(value: &str) -> RepoResult<QuestionType> {
    QuestionType::from_code(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "unknown question type `{value}` in questions.question_type"
        ))
    })
}
