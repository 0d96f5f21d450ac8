//! Single-answer question variant.
//!
//! # Invariants
//! - Body and config rows share the question's composite key.
//! - `case_sensitive` and `allow_partial_match` default to `false`.

use crate::model::question::{Difficulty, QuestionId, QuestionKey, QuestionRecord};
use crate::model::tag::Tag;
use serde::{Deserialize, Serialize};

/// Read model joining core, body, config and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleAnswerQuestion {
    pub question_id: QuestionId,
    pub difficulty: Difficulty,
    pub created_at: i64,
    pub updated_at: i64,
    pub question_text: String,
    pub correct_answer: String,
    pub case_sensitive: bool,
    pub allow_partial_match: bool,
    /// Ordered by tag name.
    pub tags: Vec<Tag>,
}

impl SingleAnswerQuestion {
    /// Checks a learner response against the configured matching rules.
    ///
    /// Both sides are trimmed. Blank responses never match. With
    /// `allow_partial_match`, either string containing the other counts.
    pub fn accepts(&self, response: &str) -> bool {
        let fold = |value: &str| {
            let trimmed = value.trim();
            if self.case_sensitive {
                trimmed.to_string()
            } else {
                trimmed.to_lowercase()
            }
        };

        let response = fold(response);
        if response.is_empty() {
            return false;
        }
        let expected = fold(&self.correct_answer);
        if self.allow_partial_match {
            expected.contains(&response) || response.contains(&expected)
        } else {
            expected == response
        }
    }
}

impl QuestionRecord for SingleAnswerQuestion {
    fn key(&self) -> QuestionKey {
        QuestionKey::single_answer(self.question_id)
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn question_text(&self) -> &str {
        &self.question_text
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

/// Input for creating a single-answer question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSingleAnswerQuestion {
    pub question_text: String,
    pub correct_answer: String,
    /// Defaults to 1.
    pub difficulty: Option<Difficulty>,
    pub case_sensitive: bool,
    pub allow_partial_match: bool,
    /// Blank names are skipped; an empty list attaches nothing.
    pub tags: Vec<String>,
}

impl NewSingleAnswerQuestion {
    pub fn new(question_text: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            correct_answer: correct_answer.into(),
            ..Self::default()
        }
    }
}

/// Partial update. `None` fields are left unchanged.
///
/// `tags: Some(vec![])` clears every tag; `tags: None` keeps them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleAnswerPatch {
    pub difficulty: Option<Difficulty>,
    pub question_text: Option<String>,
    pub correct_answer: Option<String>,
    pub case_sensitive: Option<bool>,
    pub allow_partial_match: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl SingleAnswerPatch {
    pub(crate) fn touches_config(&self) -> bool {
        self.correct_answer.is_some()
            || self.case_sensitive.is_some()
            || self.allow_partial_match.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::SingleAnswerQuestion;
    use crate::model::question::Difficulty;
    use uuid::Uuid;

    fn question(answer: &str, case_sensitive: bool, partial: bool) -> SingleAnswerQuestion {
        SingleAnswerQuestion {
            question_id: Uuid::new_v4(),
            difficulty: Difficulty::default(),
            created_at: 0,
            updated_at: 0,
            question_text: "q".to_string(),
            correct_answer: answer.to_string(),
            case_sensitive,
            allow_partial_match: partial,
            tags: Vec::new(),
        }
    }

    #[test]
    fn accepts_ignores_case_by_default() {
        let q = question("Paris", false, false);
        assert!(q.accepts(" paris "));
        assert!(!q.accepts("Pari"));
        assert!(!q.accepts("   "));
    }

    #[test]
    fn accepts_honors_case_sensitivity() {
        let q = question("Paris", true, false);
        assert!(q.accepts("Paris"));
        assert!(!q.accepts("paris"));
    }

    #[test]
    fn partial_match_accepts_either_containment() {
        let q = question("Mount Everest", false, true);
        assert!(q.accepts("everest"));
        assert!(q.accepts("the mount everest peak"));
        assert!(!q.accepts("K2"));
    }
}
