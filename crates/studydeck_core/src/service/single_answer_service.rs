//! Single-answer question use-case service.
//!
//! # Invariants
//! - Create/update/delete each run as one transaction with one persist.
//! - Tags are only replaced on update when the patch carries `tags`.

use crate::model::question::{QuestionId, QuestionKey};
use crate::model::single_answer::{NewSingleAnswerQuestion, SingleAnswerPatch, SingleAnswerQuestion};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::single_answer_repo::{SingleAnswerRepository, SqliteSingleAnswerRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::service::{ServiceError, ServiceResult};
use crate::session::StudySession;
use crate::storage::BlobStore;
use log::info;

/// Single-answer service over one storage session.
pub struct SingleAnswerService<'s, S: BlobStore> {
    session: &'s mut StudySession<S>,
}

impl<'s, S: BlobStore> SingleAnswerService<'s, S> {
    pub fn new(session: &'s mut StudySession<S>) -> Self {
        Self { session }
    }

    /// Creates a question with its body, config and tags. Returns the new id.
    pub fn create(&mut self, input: &NewSingleAnswerQuestion) -> ServiceResult<QuestionId> {
        let question_id = self.session.new_identifier();
        let key = QuestionKey::single_answer(question_id);
        self.session.write(|tx| -> ServiceResult<()> {
            SqliteSingleAnswerRepository::new(tx).insert(question_id, input)?;
            if !input.tags.is_empty() {
                SqliteTagRepository::new(tx).set_for_question(key, &input.tags)?;
            }
            Ok(())
        })?;
        info!(
            "event=question_create module=single_answer status=ok question_id={question_id} tags={}",
            input.tags.len()
        );
        Ok(question_id)
    }

    /// Gets one question; `None` when no such question exists.
    pub fn get(&self, question_id: QuestionId) -> ServiceResult<Option<SingleAnswerQuestion>> {
        Ok(SqliteSingleAnswerRepository::new(self.session.connection()).get(question_id)?)
    }

    /// All single-answer questions, most recently updated first.
    pub fn get_all(&self) -> ServiceResult<Vec<SingleAnswerQuestion>> {
        Ok(SqliteSingleAnswerRepository::new(self.session.connection()).list()?)
    }

    /// Applies a partial update. An empty patch still bumps `updated_at`.
    pub fn update(
        &mut self,
        question_id: QuestionId,
        patch: &SingleAnswerPatch,
    ) -> ServiceResult<()> {
        let key = QuestionKey::single_answer(question_id);
        self.session.write(|tx| -> ServiceResult<()> {
            if !SqliteSingleAnswerRepository::new(tx).apply_patch(question_id, patch)? {
                return Err(ServiceError::QuestionNotFound(key));
            }
            if let Some(tags) = patch.tags.as_deref() {
                SqliteTagRepository::new(tx).set_for_question(key, tags)?;
            }
            Ok(())
        })?;
        info!("event=question_update module=single_answer status=ok question_id={question_id}");
        Ok(())
    }

    /// Deletes a question and, by cascade, its body, config and tag links.
    /// Returns whether it existed.
    pub fn delete(&mut self, question_id: QuestionId) -> ServiceResult<bool> {
        let key = QuestionKey::single_answer(question_id);
        let deleted = self.session.write(|tx| -> ServiceResult<bool> {
            Ok(SqliteQuestionRepository::new(tx).delete(key)?)
        })?;
        info!(
            "event=question_delete module=single_answer status=ok question_id={question_id} deleted={deleted}"
        );
        Ok(deleted)
    }
}
