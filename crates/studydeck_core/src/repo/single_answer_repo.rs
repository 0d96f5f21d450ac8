//! Single-answer question tables: `single_answer_questions` (body) and
//! `single_answer_config` (answer rules).
//!
//! # Invariants
//! - Core, body and config rows are written together.
//! - Patch updates only touch the column groups present in the patch.

use crate::model::question::{QuestionId, QuestionKey};
use crate::model::single_answer::{NewSingleAnswerQuestion, SingleAnswerPatch, SingleAnswerQuestion};
use crate::repo::question_repo::{parse_question_id, QuestionRepository, SqliteQuestionRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{bool_to_int, parse_difficulty, parse_flag, RepoResult};
use rusqlite::{params, Connection, Row};

const SINGLE_ANSWER_SELECT_SQL: &str = "SELECT
    q.question_id,
    q.difficulty,
    q.created_at,
    q.updated_at,
    b.question_text,
    c.correct_answer,
    c.case_sensitive,
    c.allow_partial_match
FROM questions q
INNER JOIN single_answer_questions b
    ON b.question_id = q.question_id AND b.question_type = q.question_type
INNER JOIN single_answer_config c
    ON c.question_id = q.question_id AND c.question_type = q.question_type
WHERE q.question_type = 'single_answer'";

/// Repository interface for single-answer questions.
pub trait SingleAnswerRepository {
    fn insert(&self, question_id: QuestionId, input: &NewSingleAnswerQuestion) -> RepoResult<()>;
    fn get(&self, question_id: QuestionId) -> RepoResult<Option<SingleAnswerQuestion>>;
    /// All single-answer questions, `updated_at DESC, question_id ASC`.
    fn list(&self) -> RepoResult<Vec<SingleAnswerQuestion>>;
    /// Applies non-tag fields of `patch`. Returns whether the question exists.
    fn apply_patch(&self, question_id: QuestionId, patch: &SingleAnswerPatch) -> RepoResult<bool>;
}

/// SQLite-backed single-answer repository.
pub struct SqliteSingleAnswerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSingleAnswerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<SingleAnswerQuestion> {
        let id_text: String = row.get("question_id")?;
        let question_id = parse_question_id(&id_text)?;
        let tags = SqliteTagRepository::new(self.conn)
            .list_for_question(QuestionKey::single_answer(question_id))?;
        Ok(SingleAnswerQuestion {
            question_id,
            difficulty: parse_difficulty(row.get("difficulty")?)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            question_text: row.get("question_text")?,
            correct_answer: row.get("correct_answer")?,
            case_sensitive: parse_flag(
                row.get("case_sensitive")?,
                "single_answer_config.case_sensitive",
            )?,
            allow_partial_match: parse_flag(
                row.get("allow_partial_match")?,
                "single_answer_config.allow_partial_match",
            )?,
            tags,
        })
    }
}

impl SingleAnswerRepository for SqliteSingleAnswerRepository<'_> {
    fn insert(&self, question_id: QuestionId, input: &NewSingleAnswerQuestion) -> RepoResult<()> {
        let key = QuestionKey::single_answer(question_id);
        SqliteQuestionRepository::new(self.conn)
            .insert_core(key, input.difficulty.unwrap_or_default())?;

        let id_text = question_id.to_string();
        self.conn.execute(
            "INSERT INTO single_answer_questions (question_id, question_type, question_text)
             VALUES (?1, 'single_answer', ?2);",
            params![id_text, input.question_text],
        )?;
        self.conn.execute(
            "INSERT INTO single_answer_config (
                question_id,
                question_type,
                correct_answer,
                case_sensitive,
                allow_partial_match
            ) VALUES (?1, 'single_answer', ?2, ?3, ?4);",
            params![
                id_text,
                input.correct_answer,
                bool_to_int(input.case_sensitive),
                bool_to_int(input.allow_partial_match),
            ],
        )?;
        Ok(())
    }

    fn get(&self, question_id: QuestionId) -> RepoResult<Option<SingleAnswerQuestion>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SINGLE_ANSWER_SELECT_SQL} AND q.question_id = ?1;"))?;
        let mut rows = stmt.query([question_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<SingleAnswerQuestion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SINGLE_ANSWER_SELECT_SQL} ORDER BY q.updated_at DESC, q.question_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(self.parse_row(row)?);
        }
        Ok(questions)
    }

    fn apply_patch(&self, question_id: QuestionId, patch: &SingleAnswerPatch) -> RepoResult<bool> {
        let key = QuestionKey::single_answer(question_id);
        if !SqliteQuestionRepository::new(self.conn).touch(key, patch.difficulty)? {
            return Ok(false);
        }

        let id_text = question_id.to_string();
        if let Some(text) = patch.question_text.as_deref() {
            self.conn.execute(
                "UPDATE single_answer_questions
                 SET question_text = ?2
                 WHERE question_id = ?1 AND question_type = 'single_answer';",
                params![id_text, text],
            )?;
        }

        if patch.touches_config() {
            self.conn.execute(
                "UPDATE single_answer_config
                 SET
                    correct_answer = COALESCE(?2, correct_answer),
                    case_sensitive = COALESCE(?3, case_sensitive),
                    allow_partial_match = COALESCE(?4, allow_partial_match)
                 WHERE question_id = ?1 AND question_type = 'single_answer';",
                params![
                    id_text,
                    patch.correct_answer.as_deref(),
                    patch.case_sensitive.map(bool_to_int),
                    patch.allow_partial_match.map(bool_to_int),
                ],
            )?;
        }

        Ok(true)
    }
}
