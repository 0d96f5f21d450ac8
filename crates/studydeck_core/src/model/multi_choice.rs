//! Multiple-choice question variant and its option rules.
//!
//! # Invariants
//! - At least 2 options, at least 1 correct.
//! - Without multiple selection, exactly 1 option is correct.
//! - `display_order` is 0-based, contiguous and equals input position.

use crate::model::question::{Difficulty, QuestionId, QuestionKey, QuestionRecord, ValidationError};
use crate::model::tag::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

const MIN_OPTIONS: usize = 2;

/// Stable option identifier. Regenerated whenever options are replaced.
pub type OptionId = Uuid;

/// Persisted option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub option_id: OptionId,
    pub option_text: String,
    pub is_correct: bool,
    pub display_order: u32,
}

/// Option input; position in the input list becomes `display_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChoiceOption {
    pub option_text: String,
    pub is_correct: bool,
}

impl NewChoiceOption {
    pub fn new(option_text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            option_text: option_text.into(),
            is_correct,
        }
    }
}

/// Read model joining core, body, ordered options and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiChoiceQuestion {
    pub question_id: QuestionId,
    pub difficulty: Difficulty,
    pub created_at: i64,
    pub updated_at: i64,
    pub question_text: String,
    pub shuffle_options: bool,
    pub allow_multiple_selection: bool,
    /// Ordered by `display_order`.
    pub options: Vec<ChoiceOption>,
    /// Ordered by tag name.
    pub tags: Vec<Tag>,
}

impl MultiChoiceQuestion {
    /// Returns the ids of every correct option in display order.
    pub fn correct_option_ids(&self) -> Vec<OptionId> {
        self.options
            .iter()
            .filter(|option| option.is_correct)
            .map(|option| option.option_id)
            .collect()
    }

    /// A selection is correct iff it equals the set of correct options.
    ///
    /// Single-selection questions reject selections of more than one option.
    pub fn grade(&self, selected: &[OptionId]) -> bool {
        let chosen: BTreeSet<OptionId> = selected.iter().copied().collect();
        if !self.allow_multiple_selection && chosen.len() != 1 {
            return false;
        }
        let expected: BTreeSet<OptionId> = self.correct_option_ids().into_iter().collect();
        chosen == expected
    }
}

impl QuestionRecord for MultiChoiceQuestion {
    fn key(&self) -> QuestionKey {
        QuestionKey::multi_choice(self.question_id)
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

/// Complete multiple-choice payload, used for both create and update.
///
/// Updates replace everything: options are re-created and tags are reset to
/// exactly `tags`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiChoiceInput {
    pub question_text: String,
    /// Defaults to 1.
    pub difficulty: Option<Difficulty>,
    pub shuffle_options: bool,
    pub allow_multiple_selection: bool,
    pub options: Vec<NewChoiceOption>,
    pub tags: Vec<String>,
}

impl MultiChoiceInput {
    pub fn new(question_text: impl Into<String>, options: Vec<NewChoiceOption>) -> Self {
        Self {
            question_text: question_text.into(),
            options,
            ..Self::default()
        }
    }
}

/// Checks option-count and correctness rules.
pub fn validate_options(
    options: &[NewChoiceOption],
    allow_multiple: bool,
) -> Result<(), ValidationError> {
    if options.len() < MIN_OPTIONS {
        return Err(ValidationError::TooFewOptions {
            count: options.len(),
        });
    }

    let correct = options.iter().filter(|option| option.is_correct).count();
    if correct == 0 {
        return Err(ValidationError::NoCorrectOption);
    }
    if !allow_multiple && correct != 1 {
        return Err(ValidationError::SingleSelectionNeedsOneCorrect { correct });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_options, NewChoiceOption};
    use crate::model::question::ValidationError;

    fn opts(flags: &[bool]) -> Vec<NewChoiceOption> {
        flags
            .iter()
            .enumerate()
            .map(|(idx, flag)| {
                NewChoiceOption::new(format!("option {idx}"), *flag)
            })
            .collect()
    }

    #[test]
    fn rejects_single_option() {
        assert_eq!(
            validate_options(&opts(&[true]), true),
            Err(ValidationError::TooFewOptions { count: 1 })
        );
    }

    #[test]
    fn rejects_when_nothing_is_correct() {
        assert_eq!(
            validate_options(&opts(&[false, false, false]), true),
            Err(ValidationError::NoCorrectOption)
        );
    }

    #[test]
    fn single_selection_requires_exactly_one_correct() {
        assert_eq!(
            validate_options(&opts(&[true, true]), false),
            Err(ValidationError::SingleSelectionNeedsOneCorrect { correct: 2 })
        );
        assert_eq!(validate_options(&opts(&[false, true]), false), Ok(()));
    }

    #[test]
    fn multiple_selection_allows_several_correct() {
        assert_eq!(validate_options(&opts(&[true, true, false]), true), Ok(()));
    }
}
