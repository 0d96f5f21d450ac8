//! Multiple-choice question tables: `multi_choice_questions` (body) and
//! `multi_choice_options` (one row per option).
//!
//! # Invariants
//! - Options are always read in `display_order ASC`.
//! - Replacing options deletes every existing row first and re-inserts the
//!   new list with fresh ids; there is no per-option diff.
//! - Option validation is the caller's job and happens before any call here.

use crate::model::multi_choice::{
    ChoiceOption, MultiChoiceInput, MultiChoiceQuestion, NewChoiceOption,
};
use crate::model::question::{QuestionId, QuestionKey};
use crate::repo::question_repo::{parse_question_id, QuestionRepository, SqliteQuestionRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{bool_to_int, parse_difficulty, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const MULTI_CHOICE_SELECT_SQL: &str = "SELECT
    q.question_id,
    q.difficulty,
    q.created_at,
    q.updated_at,
    b.question_text,
    b.shuffle_options,
    b.allow_multiple_selection
FROM questions q
INNER JOIN multi_choice_questions b
    ON b.question_id = q.question_id AND b.question_type = q.question_type
WHERE q.question_type = 'multi_choice'";

/// Repository interface for multiple-choice questions.
pub trait MultiChoiceRepository {
    fn insert(&self, question_id: QuestionId, input: &MultiChoiceInput) -> RepoResult<()>;
    fn get(&self, question_id: QuestionId) -> RepoResult<Option<MultiChoiceQuestion>>;
    /// All multiple-choice questions, `updated_at DESC, question_id ASC`.
    fn list(&self) -> RepoResult<Vec<MultiChoiceQuestion>>;
    /// Overwrites core, body and options. Returns whether the question exists.
    fn replace(&self, question_id: QuestionId, input: &MultiChoiceInput) -> RepoResult<bool>;
    fn list_options(&self, question_id: QuestionId) -> RepoResult<Vec<ChoiceOption>>;
}

/// SQLite-backed multiple-choice repository.
pub struct SqliteMultiChoiceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMultiChoiceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert_options(
        &self,
        question_id: QuestionId,
        options: &[NewChoiceOption],
    ) -> RepoResult<()> {
        let id_text = question_id.to_string();
        let mut stmt = self.conn.prepare(
            "INSERT INTO multi_choice_options (
                option_id,
                question_id,
                question_type,
                option_text,
                is_correct,
                display_order
            ) VALUES (?1, ?2, 'multi_choice', ?3, ?4, ?5);",
        )?;
        for (position, option) in options.iter().enumerate() {
            let display_order = i64::try_from(position).map_err(|_| {
                RepoError::InvalidData(format!("option position {position} overflows i64"))
            })?;
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                id_text,
                option.option_text,
                bool_to_int(option.is_correct),
                display_order,
            ])?;
        }
        Ok(())
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<MultiChoiceQuestion> {
        let id_text: String = row.get("question_id")?;
        let question_id = parse_question_id(&id_text)?;
        let tags = SqliteTagRepository::new(self.conn)
            .list_for_question(QuestionKey::multi_choice(question_id))?;
        Ok(MultiChoiceQuestion {
            question_id,
            difficulty: parse_difficulty(row.get("difficulty")?)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            question_text: row.get("question_text")?,
            shuffle_options: parse_flag(
                row.get("shuffle_options")?,
                "multi_choice_questions.shuffle_options",
            )?,
            allow_multiple_selection: parse_flag(
                row.get("allow_multiple_selection")?,
                "multi_choice_questions.allow_multiple_selection",
            )?,
            options: self.list_options(question_id)?,
            tags,
        })
    }
}

impl MultiChoiceRepository for SqliteMultiChoiceRepository<'_> {
    fn insert(&self, question_id: QuestionId, input: &MultiChoiceInput) -> RepoResult<()> {
        let key = QuestionKey::multi_choice(question_id);
        SqliteQuestionRepository::new(self.conn)
            .insert_core(key, input.difficulty.unwrap_or_default())?;

        self.conn.execute(
            "INSERT INTO multi_choice_questions (
                question_id,
                question_type,
                question_text,
                shuffle_options,
                allow_multiple_selection
            ) VALUES (?1, 'multi_choice', ?2, ?3, ?4);",
            params![
                question_id.to_string(),
                input.question_text,
                bool_to_int(input.shuffle_options),
                bool_to_int(input.allow_multiple_selection),
            ],
        )?;
        self.insert_options(question_id, &input.options)
    }

    fn get(&self, question_id: QuestionId) -> RepoResult<Option<MultiChoiceQuestion>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MULTI_CHOICE_SELECT_SQL} AND q.question_id = ?1;"))?;
        let mut rows = stmt.query([question_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<MultiChoiceQuestion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MULTI_CHOICE_SELECT_SQL} ORDER BY q.updated_at DESC, q.question_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(self.parse_row(row)?);
        }
        Ok(questions)
    }

    fn replace(&self, question_id: QuestionId, input: &MultiChoiceInput) -> RepoResult<bool> {
        let key = QuestionKey::multi_choice(question_id);
        let difficulty = Some(input.difficulty.unwrap_or_default());
        if !SqliteQuestionRepository::new(self.conn).touch(key, difficulty)? {
            return Ok(false);
        }

        let id_text = question_id.to_string();
        self.conn.execute(
            "UPDATE multi_choice_questions
             SET
                question_text = ?2,
                shuffle_options = ?3,
                allow_multiple_selection = ?4
             WHERE question_id = ?1 AND question_type = 'multi_choice';",
            params![
                id_text,
                input.question_text,
                bool_to_int(input.shuffle_options),
                bool_to_int(input.allow_multiple_selection),
            ],
        )?;
        self.conn.execute(
            "DELETE FROM multi_choice_options
             WHERE question_id = ?1 AND question_type = 'multi_choice';",
            [id_text.as_str()],
        )?;
        self.insert_options(question_id, &input.options)?;
        Ok(true)
    }

    fn list_options(&self, question_id: QuestionId) -> RepoResult<Vec<ChoiceOption>> {
        let mut stmt = self.conn.prepare(
            "SELECT option_id, option_text, is_correct, display_order
             FROM multi_choice_options
             WHERE question_id = ?1 AND question_type = 'multi_choice'
             ORDER BY display_order ASC;",
        )?;
        let mut rows = stmt.query([question_id.to_string()])?;
        let mut options = Vec::new();
        while let Some(row) = rows.next()? {
            let option_id: String = row.get("option_id")?;
            let display_order: i64 = row.get("display_order")?;
            options.push(ChoiceOption {
                option_id: parse_uuid(&option_id, "multi_choice_options.option_id")?,
                option_text: row.get("option_text")?,
                is_correct: parse_flag(row.get("is_correct")?, "multi_choice_options.is_correct")?,
                display_order: u32::try_from(display_order).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid display_order `{display_order}` in multi_choice_options"
                    ))
                })?,
            });
        }
        Ok(options)
    }
}
