//! Tag model shared by every question type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable tag identifier.
pub type TagId = Uuid;

/// Type-agnostic label, unique by case-sensitive name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: TagId,
    pub tag_name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Trims a tag name. Blank input yields `None`; casing is preserved.
pub fn normalize_tag_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
