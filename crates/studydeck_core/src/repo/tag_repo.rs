//! Tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Sole writer of the `tags` table.
//! - Own question-tag association replacement and incremental edits.
//!
//! # Invariants
//! - Tag names are stored trimmed and matched case-sensitively.
//! - Unused tags survive until `prune_unused` runs.
//! - Association writes never touch type-specific question tables.

use crate::model::question::QuestionKey;
use crate::model::tag::{normalize_tag_name, Tag, TagId};
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Repository interface for tags and question-tag links.
pub trait TagRepository {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
    /// Returns the id of the tag named exactly `name`, creating it if needed.
    /// `name` must already be normalized.
    fn get_or_create(&self, name: &str) -> RepoResult<TagId>;
    /// All tags ordered by name.
    fn list_all(&self) -> RepoResult<Vec<Tag>>;
    /// Tags linked to one question, ordered by name.
    fn list_for_question(&self, key: QuestionKey) -> RepoResult<Vec<Tag>>;
    /// Replaces every link of `key`; blank names are skipped.
    fn set_for_question(&self, key: QuestionKey, names: &[String]) -> RepoResult<()>;
    /// Links one tag. Returns whether a new link was created.
    fn add_to_question(&self, key: QuestionKey, name: &str) -> RepoResult<bool>;
    /// Unlinks one tag by name. Returns whether a link was removed.
    fn remove_from_question(&self, key: QuestionKey, name: &str) -> RepoResult<bool>;
    /// Deletes tags without links. Returns the number deleted.
    fn prune_unused(&self) -> RepoResult<usize>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn link(&self, key: QuestionKey, tag_id: TagId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO question_tags (question_id, question_type, tag_id)
             VALUES (?1, ?2, ?3);",
            params![
                key.question_id.to_string(),
                key.question_type.as_code(),
                tag_id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        let row = self
            .conn
            .query_row(
                "SELECT tag_id, tag_name, created_at FROM tags WHERE tag_name = ?1;",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>("tag_id")?,
                        row.get::<_, String>("tag_name")?,
                        row.get::<_, i64>("created_at")?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((tag_id, tag_name, created_at)) => Ok(Some(Tag {
                tag_id: parse_uuid(&tag_id, "tags.tag_id")?,
                tag_name,
                created_at,
            })),
            None => Ok(None),
        }
    }

    fn get_or_create(&self, name: &str) -> RepoResult<TagId> {
        if let Some(existing) = self.find_by_name(name)? {
            return Ok(existing.tag_id);
        }

        let tag_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tags (tag_id, tag_name) VALUES (?1, ?2);",
            params![tag_id.to_string(), name],
        )?;
        Ok(tag_id)
    }

    fn list_all(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag_id, tag_name, created_at
             FROM tags
             ORDER BY tag_name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn list_for_question(&self, key: QuestionKey) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.tag_id, t.tag_name, t.created_at
             FROM question_tags qt
             INNER JOIN tags t ON t.tag_id = qt.tag_id
             WHERE qt.question_id = ?1
               AND qt.question_type = ?2
             ORDER BY t.tag_name ASC;",
        )?;
        let mut rows = stmt.query(params![
            key.question_id.to_string(),
            key.question_type.as_code()
        ])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn set_for_question(&self, key: QuestionKey, names: &[String]) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM question_tags WHERE question_id = ?1 AND question_type = ?2;",
            params![key.question_id.to_string(), key.question_type.as_code()],
        )?;

        for name in names.iter().filter_map(|name| normalize_tag_name(name)) {
            let tag_id = self.get_or_create(&name)?;
            self.link(key, tag_id)?;
        }
        Ok(())
    }

    fn add_to_question(&self, key: QuestionKey, name: &str) -> RepoResult<bool> {
        let tag_id = self.get_or_create(name)?;
        self.link(key, tag_id)
    }

    fn remove_from_question(&self, key: QuestionKey, name: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM question_tags
             WHERE question_id = ?1
               AND question_type = ?2
               AND tag_id IN (SELECT tag_id FROM tags WHERE tag_name = ?3);",
            params![
                key.question_id.to_string(),
                key.question_type.as_code(),
                name
            ],
        )?;
        Ok(changed > 0)
    }

    fn prune_unused(&self) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM tags
             WHERE NOT EXISTS (
                SELECT 1 FROM question_tags qt WHERE qt.tag_id = tags.tag_id
             );",
            [],
        )?;
        Ok(deleted)
    }
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    let tag_id: String = row.get("tag_id")?;
    Ok(Tag {
        tag_id: parse_uuid(&tag_id, "tags.tag_id")?,
        tag_name: row.get("tag_name")?,
        created_at: row.get("created_at")?,
    })
}
