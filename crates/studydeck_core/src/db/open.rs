//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open empty or image-backed in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::image::restore_image;
use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opens an empty in-memory SQLite database and applies the full schema.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=fresh");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=fresh duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=fresh duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=fresh duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Loads a previously exported database image into a new in-memory
/// connection and migrates it to the latest schema.
///
/// # Side effects
/// - Writes the image to a temporary file for the SQLite restore call.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_from_image(image: &[u8]) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=image bytes={}",
        image.len()
    );

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| -> DbResult<Connection> {
            restore_image(&mut conn, image)?;
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });

    match result {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=image duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=image duration_ms={} error_code=db_image_load_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    apply_migrations(conn)?;
    Ok(())
}
