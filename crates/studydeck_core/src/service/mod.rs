//! Use-case services over a `StudySession`.
//!
//! # Responsibility
//! - Validate input before any write.
//! - Run each logical operation as one session write (one transaction, one
//!   persist), composing question and tag repositories.
//!
//! # Invariants
//! - Validation failures never reach the database.
//! - "Not found" on single reads is `Ok(None)`, never an error.

use crate::model::question::{QuestionKey, ValidationError};
use crate::repo::RepoError;
use crate::session::SessionError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod multi_choice_service;
pub mod question_service;
pub mod single_answer_service;
pub mod tag_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by question and tag use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any write; message is user-presentable.
    Validation(ValidationError),
    /// Mutation targeted a question that does not exist.
    QuestionNotFound(QuestionKey),
    Repo(RepoError),
    Session(SessionError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::QuestionNotFound(key) => write!(f, "question not found: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::QuestionNotFound(_) => None,
            Self::Repo(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SessionError> for ServiceError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}
