//! Question-bank domain model.
//!
//! # Responsibility
//! - Define the typed question variants, their shared surface and tags.
//! - Own validation rules that must run before any write.
//!
//! # Invariants
//! - Every question is identified by `QuestionKey` (id + type).
//! - Variant-specific data never leaks into the shared `questions` core.

pub mod multi_choice;
pub mod question;
pub mod single_answer;
pub mod tag;
