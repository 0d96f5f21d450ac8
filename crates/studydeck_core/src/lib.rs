//! Core storage and domain logic for StudyDeck.
//! This crate is the single source of truth for question-bank invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod storage;

pub use config::{load_config, ConfigError, StudyConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::multi_choice::{
    validate_options, ChoiceOption, MultiChoiceInput, MultiChoiceQuestion, NewChoiceOption,
    OptionId,
};
pub use model::question::{
    Difficulty, Question, QuestionId, QuestionKey, QuestionRecord, QuestionType, QuestionTypeInfo,
    ValidationError,
};
pub use model::single_answer::{NewSingleAnswerQuestion, SingleAnswerPatch, SingleAnswerQuestion};
pub use model::tag::{Tag, TagId};
pub use repo::{RepoError, RepoResult};
pub use service::multi_choice_service::MultiChoiceService;
pub use service::question_service::QuestionService;
pub use service::single_answer_service::SingleAnswerService;
pub use service::tag_service::TagService;
pub use service::{ServiceError, ServiceResult};
pub use session::{
    QueryRow, SessionError, SessionResult, SessionSlot, StudySession, DATABASE_IMAGE_KEY,
    LEGACY_IMAGE_KEY,
};
pub use storage::{
    BlobStore, DirBlobStore, MemoryBlobStore, NoteId, NoteRecord, NoteStore, StorageError,
    StorageResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
