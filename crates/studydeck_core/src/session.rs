//! Storage session: the single owner of the live SQLite connection.
//!
//! # Responsibility
//! - Load the database image from the blob store, or create a fresh schema.
//! - Run the one-time migration of a legacy base64 image.
//! - Funnel every mutation through a transaction followed by a full-image
//!   persist.
//!
//! # Invariants
//! - A `StudySession` value is always initialized; `SessionSlot` is the only
//!   place an uninitialized state exists.
//! - Each successful `write`/`run_and_persist` stores the complete image
//!   under `DATABASE_IMAGE_KEY`. Cost is O(database size) per write.
//! - A failed write rolls back and persists nothing.

use crate::db::{export_image, open_db_from_image, open_db_in_memory, DbError};
use crate::storage::{BlobStore, NoteStore, StorageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, Params, Transaction};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Blob store key holding the latest full database image.
pub const DATABASE_IMAGE_KEY: &str = "database_image";
/// Legacy flat-store key holding a base64 database image.
pub const LEGACY_IMAGE_KEY: &str = "studydeck_sqlite_db";

/// One result row keyed by column alias.
pub type QueryRow = BTreeMap<String, Value>;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    /// The SQLite runtime or a stored image could not be loaded.
    Initialization(DbError),
    /// `SessionSlot::handle` was called before `initialize`.
    NotInitialized,
    /// Legacy flat-store value does not decode to an openable image.
    LegacyImage(String),
    Db(DbError),
    Storage(StorageError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialization(err) => write!(f, "session initialization failed: {err}"),
            Self::NotInitialized => write!(f, "storage session is not initialized"),
            Self::LegacyImage(message) => write!(f, "legacy database image rejected: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Initialization(err) | Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotInitialized | Self::LegacyImage(_) => None,
        }
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StorageError> for SessionError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Live database plus the blob store it is persisted to.
pub struct StudySession<S: BlobStore> {
    conn: Connection,
    store: S,
}

impl<S: BlobStore> StudySession<S> {
    /// Opens a session over `store`.
    ///
    /// When `legacy` holds an image under `LEGACY_IMAGE_KEY` it is moved into
    /// `store` first (only if `store` has no image yet) and the legacy key is
    /// removed either way.
    pub fn initialize(mut store: S, legacy: Option<&mut dyn BlobStore>) -> SessionResult<Self> {
        let conn = open_connection(&mut store, legacy)?;
        Ok(Self { conn, store })
    }

    /// Read-only access to the live connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a read query and returns every row keyed by column alias.
    ///
    /// No matching rows is an empty vector.
    pub fn query<P: Params>(&self, sql: &str, params: P) -> SessionResult<Vec<QueryRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut mapped = QueryRow::new();
            for (idx, column) in columns.iter().enumerate() {
                mapped.insert(column.clone(), row.get::<_, Value>(idx)?);
            }
            out.push(mapped);
        }
        Ok(out)
    }

    /// Executes one mutating statement, then persists the full image.
    ///
    /// Returns the number of changed rows.
    pub fn run_and_persist<P: Params>(&mut self, sql: &str, params: P) -> SessionResult<usize> {
        let changed = self.conn.execute(sql, params)?;
        self.persist()?;
        Ok(changed)
    }

    /// Runs `op` inside one transaction, commits, then persists once.
    ///
    /// Any error from `op` rolls the transaction back and skips persistence.
    pub fn write<T, E, F>(&mut self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<SessionError>,
    {
        let tx = self.conn.transaction().map_err(SessionError::from)?;
        let value = op(&tx)?;
        tx.commit().map_err(SessionError::from)?;
        self.persist()?;
        Ok(value)
    }

    /// Serializes the live database and stores it under `DATABASE_IMAGE_KEY`.
    ///
    /// Always writes the full image, so cost grows with database size.
    pub fn persist(&mut self) -> SessionResult<()> {
        let started_at = Instant::now();
        let image = export_image(&self.conn)?;
        if let Err(err) = self.store.put(DATABASE_IMAGE_KEY, &image) {
            error!(
                "event=db_persist module=session status=error bytes={} error={}",
                image.len(),
                err
            );
            return Err(err.into());
        }
        debug!(
            "event=db_persist module=session status=ok bytes={} duration_ms={}",
            image.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Returns a full snapshot of the live database.
    pub fn export_image(&self) -> SessionResult<Vec<u8>> {
        let image = export_image(&self.conn)?;
        info!(
            "event=db_export module=session status=ok bytes={}",
            image.len()
        );
        Ok(image)
    }

    /// Replaces the live database with `image` and persists it.
    ///
    /// The current database stays active when the image is rejected.
    pub fn import_image(&mut self, image: &[u8]) -> SessionResult<()> {
        let conn = open_db_from_image(image)?;
        self.conn = conn;
        self.persist()?;
        info!(
            "event=db_import module=session status=ok bytes={}",
            image.len()
        );
        Ok(())
    }

    /// Returns a fresh UUID-v4 shaped identifier string.
    pub fn generate_identifier(&self) -> String {
        self.new_identifier().to_string()
    }

    /// Typed form of `generate_identifier`.
    pub fn new_identifier(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Note collection stored next to the database image.
    pub fn notes(&mut self) -> NoteStore<'_, S> {
        NoteStore::new(&mut self.store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drops the connection and hands the blob store back.
    pub fn into_store(self) -> S {
        self.store
    }
}

/// Lazily initialized holder for a composition root.
///
/// `initialize` is idempotent; `handle` fails loudly before it.
pub struct SessionSlot<S: BlobStore> {
    store: Option<S>,
    session: Option<StudySession<S>>,
}

impl<S: BlobStore> SessionSlot<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Some(store),
            session: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Initializes on first call and returns the existing session afterwards.
    pub fn initialize(
        &mut self,
        legacy: Option<&mut dyn BlobStore>,
    ) -> SessionResult<&mut StudySession<S>> {
        if self.session.is_none() {
            let store = self.store.as_mut().ok_or(SessionError::NotInitialized)?;
            let conn = open_connection(store, legacy)?;
            let store = self.store.take().ok_or(SessionError::NotInitialized)?;
            self.session = Some(StudySession { conn, store });
        }
        self.handle()
    }

    /// Returns the live session or `SessionError::NotInitialized`.
    pub fn handle(&mut self) -> SessionResult<&mut StudySession<S>> {
        self.session.as_mut().ok_or(SessionError::NotInitialized)
    }
}

fn open_connection<S: BlobStore>(
    store: &mut S,
    legacy: Option<&mut dyn BlobStore>,
) -> SessionResult<Connection> {
    let started_at = Instant::now();
    info!("event=session_init module=session status=start");

    if let Some(legacy) = legacy {
        migrate_legacy_image(legacy, store)?;
    }

    let (conn, mode) = match store.get(DATABASE_IMAGE_KEY)? {
        Some(image) => (
            open_db_from_image(&image).map_err(SessionError::Initialization)?,
            "image",
        ),
        None => (
            open_db_in_memory().map_err(SessionError::Initialization)?,
            "fresh",
        ),
    };

    info!(
        "event=session_init module=session status=ok mode={} duration_ms={}",
        mode,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn migrate_legacy_image<S: BlobStore>(
    legacy: &mut dyn BlobStore,
    store: &mut S,
) -> SessionResult<()> {
    let Some(encoded) = legacy.get(LEGACY_IMAGE_KEY)? else {
        return Ok(());
    };

    if store.get(DATABASE_IMAGE_KEY)?.is_some() {
        warn!(
            "event=legacy_migrate module=session status=skipped reason=image_exists legacy_bytes={}",
            encoded.len()
        );
    } else {
        let image = decode_legacy_image(&encoded)?;
        // Both stores stay untouched when the decoded bytes do not open.
        if let Err(err) = open_db_from_image(&image) {
            let message = format!("not a database image: {err}");
            return Err(SessionError::LegacyImage(message));
        }
        store.put(DATABASE_IMAGE_KEY, &image)?;
        info!(
            "event=legacy_migrate module=session status=ok bytes={}",
            image.len()
        );
    }

    legacy.delete(LEGACY_IMAGE_KEY)?;
    Ok(())
}

fn decode_legacy_image(encoded: &[u8]) -> SessionResult<Vec<u8>> {
    let text = std::str::from_utf8(encoded)
        .map_err(|err| SessionError::LegacyImage(format!("not utf-8 text: {err}")))?;
    STANDARD
        .decode(text.trim())
        .map_err(|err| SessionError::LegacyImage(format!("invalid base64: {err}")))
}
