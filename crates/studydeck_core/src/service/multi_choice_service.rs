//! Multiple-choice question use-case service.
//!
//! # Invariants
//! - `validate_options` runs before every create/update write.
//! - Updates take the complete payload: options are recreated and tags are
//!   reset to exactly the given list (empty clears them).

use crate::model::multi_choice::{validate_options, MultiChoiceInput, MultiChoiceQuestion};
use crate::model::question::{QuestionId, QuestionKey};
use crate::repo::multi_choice_repo::{MultiChoiceRepository, SqliteMultiChoiceRepository};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::service::{ServiceError, ServiceResult};
use crate::session::StudySession;
use crate::storage::BlobStore;
use log::{info, warn};

/// Multiple-choice service over one storage session.
pub struct MultiChoiceService<'s, S: BlobStore> {
    session: &'s mut StudySession<S>,
}

impl<'s, S: BlobStore> MultiChoiceService<'s, S> {
    pub fn new(session: &'s mut StudySession<S>) -> Self {
        Self { session }
    }

    /// Validates and creates a question with ordered options and tags.
    pub fn create(&mut self, input: &MultiChoiceInput) -> ServiceResult<QuestionId> {
        check_options(input)?;

        let question_id = self.session.new_identifier();
        let key = QuestionKey::multi_choice(question_id);
        self.session.write(|tx| -> ServiceResult<()> {
            SqliteMultiChoiceRepository::new(tx).insert(question_id, input)?;
            if !input.tags.is_empty() {
                SqliteTagRepository::new(tx).set_for_question(key, &input.tags)?;
            }
            Ok(())
        })?;
        info!(
            "event=question_create module=multi_choice status=ok question_id={question_id} options={} tags={}",
            input.options.len(),
            input.tags.len()
        );
        Ok(question_id)
    }

    /// Gets one question with options in display order; `None` when absent.
    pub fn get(&self, question_id: QuestionId) -> ServiceResult<Option<MultiChoiceQuestion>> {
        Ok(SqliteMultiChoiceRepository::new(self.session.connection()).get(question_id)?)
    }

    /// All multiple-choice questions, most recently updated first.
    pub fn get_all(&self) -> ServiceResult<Vec<MultiChoiceQuestion>> {
        Ok(SqliteMultiChoiceRepository::new(self.session.connection()).list()?)
    }

    /// Replaces the whole question: fields, options (fresh ids) and tags.
    pub fn update(
        &mut self,
        question_id: QuestionId,
        input: &MultiChoiceInput,
    ) -> ServiceResult<()> {
        check_options(input)?;

        let key = QuestionKey::multi_choice(question_id);
        self.session.write(|tx| -> ServiceResult<()> {
            if !SqliteMultiChoiceRepository::new(tx).replace(question_id, input)? {
                return Err(ServiceError::QuestionNotFound(key));
            }
            SqliteTagRepository::new(tx).set_for_question(key, &input.tags)?;
            Ok(())
        })?;
        info!(
            "event=question_update module=multi_choice status=ok question_id={question_id} options={}",
            input.options.len()
        );
        Ok(())
    }

    /// Deletes a question and, by cascade, its body, options and tag links.
    /// Returns whether it existed.
    pub fn delete(&mut self, question_id: QuestionId) -> ServiceResult<bool> {
        let key = QuestionKey::multi_choice(question_id);
        let deleted = self.session.write(|tx| -> ServiceResult<bool> {
            Ok(SqliteQuestionRepository::new(tx).delete(key)?)
        })?;
        info!(
            "event=question_delete module=multi_choice status=ok question_id={question_id} deleted={deleted}"
        );
        Ok(deleted)
    }
}

fn check_options(input: &MultiChoiceInput) -> ServiceResult<()> {
    validate_options(&input.options, input.allow_multiple_selection).map_err(|err| {
        warn!("event=question_validate module=multi_choice status=rejected reason={err}");
        ServiceError::Validation(err)
    })
}
