//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Confirm every known question type is registered once the schema is current.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Each question type owns exactly one migration; the shared core
//!   (type registry, `questions`, tags) is always migration 1.

use crate::db::{DbError, DbResult};
use crate::model::question::QuestionType;
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    /// Question type whose body tables this step creates; `None` for the shared core.
    question_type: Option<QuestionType>,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        question_type: None,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        question_type: Some(QuestionType::SingleAnswer),
        sql: include_str!("0002_single_answer.sql"),
    },
    Migration {
        version: 3,
        question_type: Some(QuestionType::MultiChoice),
        sql: include_str!("0003_multi_choice.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return verify_type_registry(conn);
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate_step module=db status=ok version={} scope={}",
            migration.version,
            migration.question_type.map_or("core", QuestionType::as_code)
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    verify_type_registry(conn)
}

/// Checks that every question type has a `question_types` row.
///
/// Images restored from elsewhere can be at the latest version yet miss a
/// registry row; body inserts for that type would then fail on the foreign key.
pub fn verify_type_registry(conn: &Connection) -> DbResult<()> {
    for question_type in QuestionType::ALL {
        let code = question_type.as_code();
        let registered = conn
            .query_row(
                "SELECT 1 FROM question_types WHERE type_code = ?1;",
                [code],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !registered {
            error!(
                "event=db_migrate module=db status=error error_code=type_not_registered type_code={code}"
            );
            return Err(DbError::UnregisteredQuestionType(code));
        }
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
