//! Tag use-case service.
//!
//! # Responsibility
//! - Resolve/create tags by exact name and manage question links.
//! - Persist after every mutating call.
//!
//! # Invariants
//! - Blank names are a validation error for single-tag calls and are
//!   skipped inside `set_for_question`.
//! - Link mutations bump the question's `updated_at`.
//! - Unused tags are only removed by `prune_unused`.

use crate::model::question::{QuestionKey, ValidationError};
use crate::model::tag::{normalize_tag_name, Tag, TagId};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::service::{ServiceError, ServiceResult};
use crate::session::StudySession;
use crate::storage::BlobStore;
use log::info;
use rusqlite::Connection;

/// Tag service over one storage session.
pub struct TagService<'s, S: BlobStore> {
    session: &'s mut StudySession<S>,
}

impl<'s, S: BlobStore> TagService<'s, S> {
    pub fn new(session: &'s mut StudySession<S>) -> Self {
        Self { session }
    }

    /// Returns the id of the tag named `name` (trimmed, case-sensitive),
    /// creating and persisting it when missing.
    pub fn get_or_create(&mut self, name: &str) -> ServiceResult<TagId> {
        let name = normalize_tag_name(name).ok_or(ValidationError::BlankTagName)?;
        self.session.write(|tx| -> ServiceResult<TagId> {
            Ok(SqliteTagRepository::new(tx).get_or_create(&name)?)
        })
    }

    /// All tags ordered by name.
    pub fn list_all(&self) -> ServiceResult<Vec<Tag>> {
        Ok(SqliteTagRepository::new(self.session.connection()).list_all()?)
    }

    /// Tags linked to one question, ordered by name.
    pub fn list_for_question(&self, key: QuestionKey) -> ServiceResult<Vec<Tag>> {
        Ok(SqliteTagRepository::new(self.session.connection()).list_for_question(key)?)
    }

    /// Replaces the full tag set of a question. Input order is irrelevant and
    /// duplicates collapse.
    pub fn set_for_question(&mut self, key: QuestionKey, names: &[String]) -> ServiceResult<()> {
        self.session.write(|tx| -> ServiceResult<()> {
            ensure_question(tx, key)?;
            SqliteTagRepository::new(tx).set_for_question(key, names)?;
            SqliteQuestionRepository::new(tx).touch(key, None)?;
            Ok(())
        })?;
        info!(
            "event=tags_set module=tag status=ok question_type={} question_id={} count={}",
            key.question_type,
            key.question_id,
            names.len()
        );
        Ok(())
    }

    /// Links one tag by name. Returns whether a new link was created.
    pub fn add_tag(&mut self, key: QuestionKey, name: &str) -> ServiceResult<bool> {
        let name = normalize_tag_name(name).ok_or(ValidationError::BlankTagName)?;
        self.session.write(|tx| -> ServiceResult<bool> {
            ensure_question(tx, key)?;
            let added = SqliteTagRepository::new(tx).add_to_question(key, &name)?;
            if added {
                SqliteQuestionRepository::new(tx).touch(key, None)?;
            }
            Ok(added)
        })
    }

    /// Unlinks one tag by name. Returns whether a link was removed.
    pub fn remove_tag(&mut self, key: QuestionKey, name: &str) -> ServiceResult<bool> {
        let name = normalize_tag_name(name).ok_or(ValidationError::BlankTagName)?;
        self.session.write(|tx| -> ServiceResult<bool> {
            ensure_question(tx, key)?;
            let removed = SqliteTagRepository::new(tx).remove_from_question(key, &name)?;
            if removed {
                SqliteQuestionRepository::new(tx).touch(key, None)?;
            }
            Ok(removed)
        })
    }

    /// Deletes every tag without links. Returns the number deleted.
    pub fn prune_unused(&mut self) -> ServiceResult<usize> {
        let deleted = self.session.write(|tx| -> ServiceResult<usize> {
            Ok(SqliteTagRepository::new(tx).prune_unused()?)
        })?;
        info!("event=tags_prune module=tag status=ok deleted={deleted}");
        Ok(deleted)
    }
}

fn ensure_question(conn: &Connection, key: QuestionKey) -> ServiceResult<()> {
    if SqliteQuestionRepository::new(conn).exists(key)? {
        Ok(())
    } else {
        Err(ServiceError::QuestionNotFound(key))
    }
}
