//! Shared question vocabulary: type registry codes, composite keys,
//! difficulty, the cross-variant `Question` sum type and validation errors.

use crate::model::multi_choice::MultiChoiceQuestion;
use crate::model::single_answer::SingleAnswerQuestion;
use crate::model::tag::Tag;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable question identifier; unique together with `QuestionType`.
pub type QuestionId = Uuid;

/// Question kinds registered in `question_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// One free-text answer.
    SingleAnswer,
    /// Pick one or more options.
    MultiChoice,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [QuestionType::SingleAnswer, QuestionType::MultiChoice];

    /// Registry code stored in `question_type` columns.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::SingleAnswer => "single_answer",
            Self::MultiChoice => "multi_choice",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "single_answer" => Some(Self::SingleAnswer),
            "multi_choice" => Some(Self::MultiChoice),
            _ => None,
        }
    }

    /// Human-readable label seeded into the registry.
    pub fn description(self) -> &'static str {
        match self {
            Self::SingleAnswer => "Question answered with one free-text response",
            Self::MultiChoice => "Question answered by picking from a list of options",
        }
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Composite primary key shared by every question table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionKey {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
}

impl QuestionKey {
    pub fn new(question_id: QuestionId, question_type: QuestionType) -> Self {
        Self {
            question_id,
            question_type,
        }
    }

    pub fn single_answer(question_id: QuestionId) -> Self {
        Self::new(question_id, QuestionType::SingleAnswer)
    }

    pub fn multi_choice(question_id: QuestionId) -> Self {
        Self::new(question_id, QuestionType::MultiChoice)
    }
}

impl Display for QuestionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.question_type, self.question_id)
    }
}

/// Question difficulty on a 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::DifficultyOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for i64 {
    fn from(value: Difficulty) -> Self {
        i64::from(value.0)
    }
}

/// Rule violations detected before any write happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DifficultyOutOfRange(i64),
    /// Tag name is empty after trimming.
    BlankTagName,
    /// Multiple-choice questions need at least two options.
    TooFewOptions { count: usize },
    /// No option is marked correct.
    NoCorrectOption,
    /// Single-selection questions need exactly one correct option.
    SingleSelectionNeedsOneCorrect { correct: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DifficultyOutOfRange(value) => write!(
                f,
                "difficulty must be between {} and {}, got {value}",
                Difficulty::MIN,
                Difficulty::MAX
            ),
            Self::BlankTagName => write!(f, "tag name must not be blank"),
            Self::TooFewOptions { count } => {
                write!(f, "at least 2 options are required, got {count}")
            }
            Self::NoCorrectOption => write!(f, "at least one option must be marked correct"),
            Self::SingleSelectionNeedsOneCorrect { correct } => write!(
                f,
                "exactly one option must be correct when multiple selection is disabled, got {correct}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Surface shared by every question variant.
pub trait QuestionRecord {
    fn key(&self) -> QuestionKey;
    fn difficulty(&self) -> Difficulty;
    fn created_at(&self) -> i64;
    fn updated_at(&self) -> i64;
    fn question_text(&self) -> &str;
    fn tags(&self) -> &[Tag];

    fn question_id(&self) -> QuestionId {
        self.key().question_id
    }

    fn question_type(&self) -> QuestionType {
        self.key().question_type
    }
}

/// Any stored question, tagged by variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    SingleAnswer(SingleAnswerQuestion),
    MultiChoice(MultiChoiceQuestion),
}

impl Question {
    fn record(&self) -> &dyn QuestionRecord {
        match self {
            Self::SingleAnswer(question) => question as &dyn QuestionRecord,
            Self::MultiChoice(question) => question,
        }
    }
}

impl QuestionRecord for Question {
    fn key(&self) -> QuestionKey {
        self.record().key()
    }

    fn difficulty(&self) -> Difficulty {
        self.record().difficulty()
    }

    fn created_at(&self) -> i64 {
        self.record().created_at()
    }

    fn updated_at(&self) -> i64 {
        self.record().updated_at()
    }

    fn question_text(&self) -> &str {
        self.record().question_text()
    }

    fn tags(&self) -> &[Tag] {
        self.record().tags()
    }
}

impl From<SingleAnswerQuestion> for Question {
    fn from(value: SingleAnswerQuestion) -> Self {
        Self::SingleAnswer(value)
    }
}

impl From<MultiChoiceQuestion> for Question {
    fn from(value: MultiChoiceQuestion) -> Self {
        Self::MultiChoice(value)
    }
}

/// Row of the `question_types` registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTypeInfo {
    pub type_code: String,
    pub description: String,
}
