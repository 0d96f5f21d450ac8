//! Cross-type question queries and deletion.
//!
//! # Responsibility
//! - Present every question variant through the `Question` sum type.
//! - Dispatch per-key reads to the owning type repository.

use crate::model::question::{Question, QuestionKey, QuestionRecord, QuestionType, QuestionTypeInfo};
use crate::model::tag::normalize_tag_name;
use crate::repo::multi_choice_repo::{MultiChoiceRepository, SqliteMultiChoiceRepository};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::single_answer_repo::{SingleAnswerRepository, SqliteSingleAnswerRepository};
use crate::repo::RepoResult;
use crate::service::ServiceResult;
use crate::session::StudySession;
use crate::storage::BlobStore;
use log::info;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Read/delete facade across question types.
pub struct QuestionService<'s, S: BlobStore> {
    session: &'s mut StudySession<S>,
}

impl<'s, S: BlobStore> QuestionService<'s, S> {
    pub fn new(session: &'s mut StudySession<S>) -> Self {
        Self { session }
    }

    /// Gets any question by composite key; `None` when absent.
    pub fn get(&self, key: QuestionKey) -> ServiceResult<Option<Question>> {
        Ok(load_question(self.session.connection(), key)?)
    }

    /// Every question, `updated_at DESC, question_id ASC`.
    pub fn list_all(&self) -> ServiceResult<Vec<Question>> {
        let conn = self.session.connection();
        let mut questions: Vec<Question> = SqliteSingleAnswerRepository::new(conn)
            .list()?
            .into_iter()
            .map(Question::from)
            .collect();
        questions.extend(
            SqliteMultiChoiceRepository::new(conn)
                .list()?
                .into_iter()
                .map(Question::from),
        );
        sort_questions(&mut questions);
        Ok(questions)
    }

    /// Questions linked to the tag named exactly `tag_name` (trimmed).
    pub fn list_by_tag(&self, tag_name: &str) -> ServiceResult<Vec<Question>> {
        let Some(tag_name) = normalize_tag_name(tag_name) else {
            return Ok(Vec::new());
        };
        let conn = self.session.connection();
        let mut questions = Vec::new();
        for key in SqliteQuestionRepository::new(conn).keys_with_tag(&tag_name)? {
            if let Some(question) = load_question(conn, key)? {
                questions.push(question);
            }
        }
        sort_questions(&mut questions);
        Ok(questions)
    }

    /// Number of stored questions per type.
    pub fn count_by_type(&self) -> ServiceResult<BTreeMap<QuestionType, u64>> {
        Ok(SqliteQuestionRepository::new(self.session.connection()).count_by_type()?)
    }

    /// Rows of the `question_types` registry ordered by code.
    pub fn list_question_types(&self) -> ServiceResult<Vec<QuestionTypeInfo>> {
        Ok(SqliteQuestionRepository::new(self.session.connection()).list_question_types()?)
    }

    /// Deletes any question by key. Returns whether it existed.
    pub fn delete(&mut self, key: QuestionKey) -> ServiceResult<bool> {
        let deleted = self.session.write(|tx| -> ServiceResult<bool> {
            Ok(SqliteQuestionRepository::new(tx).delete(key)?)
        })?;
        info!(
            "event=question_delete module=question status=ok question_type={} question_id={} deleted={deleted}",
            key.question_type, key.question_id
        );
        Ok(deleted)
    }
}

fn load_question(conn: &Connection, key: QuestionKey) -> RepoResult<Option<Question>> {
    let question = match key.question_type {
        QuestionType::SingleAnswer => SqliteSingleAnswerRepository::new(conn)
            .get(key.question_id)?
            .map(Question::from),
        QuestionType::MultiChoice => SqliteMultiChoiceRepository::new(conn)
            .get(key.question_id)?
            .map(Question::from),
    };
    Ok(question)
}

fn sort_questions(questions: &mut [Question]) {
    questions.sort_by(|a, b| {
        b.updated_at()
            .cmp(&a.updated_at())
            .then(a.question_id().cmp(&b.question_id()))
    });
}
