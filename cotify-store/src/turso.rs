//! libSQL-backed record store.
//!
//! Talks to a remote Turso database in production. With the `turso-local`
//! feature (and in tests) it can also open a local file or in-memory
//! database through the embedded SQLite engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params::Params;
use libsql::{Builder, Connection, Database, Row, Value};
use tracing::{debug, info, instrument};

use cotify_core::error::{CotifyError, Result};
use cotify_core::traits::RecordStore;
use cotify_core::types::{ListFilter, Record, RecordDraft};

/// Schema for the `records` table.
///
/// Timestamps are Unix milliseconds. `url` is unique across live and
/// soft-deleted rows alike.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT    NOT NULL UNIQUE,
    title       TEXT    NOT NULL,
    kind        TEXT    NOT NULL,
    attributes  TEXT    NOT NULL DEFAULT '',
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    deleted_at  INTEGER
);
CREATE INDEX IF NOT EXISTS idx_records_kind ON records(kind);
CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at);
";

const COLUMNS: &str = "id, url, title, kind, attributes, created_at, updated_at, deleted_at";

/// SQLite reports unique index violations with this message prefix.
const UNIQUE_VIOLATION: &str = "UNIQUE constraint failed";

/// Record store on top of a libSQL database.
pub struct TursoStore {
    // Keeps the database alive for the connection's lifetime.
    _db: Database,
    conn: Connection,
}

impl std::fmt::Debug for TursoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TursoStore").finish_non_exhaustive()
    }
}

impl TursoStore {
    /// Connects to a remote Turso database and applies the schema.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(backend_error)?;
        info!(url, "Connected to Turso");
        Self::from_database(db).await
    }

    /// Opens (or creates) a local database file and applies the schema.
    #[cfg(any(test, feature = "turso-local"))]
    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(backend_error)?;
        info!(path, "Opened local libSQL database");
        Self::from_database(db).await
    }

    /// Opens a private in-memory database.
    #[cfg(any(test, feature = "turso-local"))]
    pub async fn open_in_memory() -> Result<Self> {
        Self::open_local(":memory:").await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(backend_error)?;
        let store = Self { _db: db, conn };
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the `records` table and its indexes if missing. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .await
            .map_err(backend_error)?;
        debug!("Schema applied");
        Ok(())
    }

    /// Marks the record for `key` as deleted. Returns false if there was no
    /// live record.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, key: &str) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        let changed = self
            .conn
            .execute(
                "UPDATE records SET deleted_at = ?1, updated_at = ?1 \
                 WHERE url = ?2 AND deleted_at IS NULL",
                Params::Positional(vec![Value::Integer(now), Value::Text(key.to_string())]),
            )
            .await
            .map_err(backend_error)?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl RecordStore for TursoStore {
    #[instrument(skip(self))]
    async fn find_by_key(&self, key: &str) -> Result<Option<Record>> {
        let sql = format!("SELECT {COLUMNS} FROM records WHERE url = ?1 AND deleted_at IS NULL");
        let mut rows = self
            .conn
            .query(&sql, Params::Positional(vec![Value::Text(key.to_string())]))
            .await
            .map_err(backend_error)?;

        match rows.next().await.map_err(backend_error)? {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, draft), fields(key = %draft.key))]
    async fn insert(&self, draft: RecordDraft) -> Result<Record> {
        draft.validate()?;

        // Stored at millisecond precision; truncate so the returned record
        // equals what a later read produces.
        let now = from_millis(Utc::now().timestamp_millis())?;
        let millis = now.timestamp_millis();

        let sql = "INSERT INTO records (url, title, kind, attributes, created_at, updated_at) \
                   VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING id";
        let params = Params::Positional(vec![
            Value::Text(draft.key.clone()),
            Value::Text(draft.title.clone()),
            Value::Text(draft.kind.clone()),
            Value::Text(draft.attributes.clone()),
            Value::Integer(millis),
        ]);

        let mut rows = match self.conn.query(sql, params).await {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                debug!("Key already stored");
                return Err(CotifyError::UniqueConflict(draft.key));
            }
            Err(e) => return Err(backend_error(e)),
        };

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => {
                return Err(CotifyError::InternalError(
                    "insert returned no id".into(),
                ))
            }
            Err(e) if is_unique_violation(&e) => {
                debug!("Key already stored");
                return Err(CotifyError::UniqueConflict(draft.key));
            }
            Err(e) => return Err(backend_error(e)),
        };
        let id = row.get::<i64>(0).map_err(backend_error)?;

        debug!(id, kind = %draft.kind, "Inserted record");
        Ok(Record::from_draft(id as u64, draft, now))
    }

    #[instrument(skip(self))]
    async fn list_filtered(&self, filter: &ListFilter) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT {COLUMNS} FROM records WHERE deleted_at IS NULL");
        let mut args = Vec::new();

        if let Some(kind) = &filter.kind {
            args.push(Value::Text(kind.clone()));
            sql.push_str(&format!(" AND kind = ?{}", args.len()));
        }
        if let Some(from) = filter.from {
            args.push(Value::Integer(from.timestamp_millis()));
            sql.push_str(&format!(" AND created_at >= ?{}", args.len()));
        }
        if let Some(to) = filter.to {
            args.push(Value::Integer(to.timestamp_millis()));
            sql.push_str(&format!(" AND created_at <= ?{}", args.len()));
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut rows = self
            .conn
            .query(&sql, Params::Positional(args))
            .await
            .map_err(backend_error)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(backend_error)? {
            records.push(record_from_row(&row)?);
        }

        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM records WHERE deleted_at IS NULL", ())
            .await
            .map_err(backend_error)?;

        match rows.next().await.map_err(backend_error)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(backend_error)? as u64),
            None => Ok(0),
        }
    }
}

fn backend_error(e: libsql::Error) -> CotifyError {
    CotifyError::BackendUnavailable(e.to_string())
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains(UNIQUE_VIOLATION)
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CotifyError::InternalError(format!("timestamp out of range: {millis}")))
}

fn text(row: &Row, idx: i32) -> Result<String> {
    row.get::<String>(idx).map_err(backend_error)
}

fn record_from_row(row: &Row) -> Result<Record> {
    let deleted_at = match row.get_value(7).map_err(backend_error)? {
        Value::Integer(millis) => Some(from_millis(millis)?),
        _ => None,
    };

    Ok(Record {
        id: row.get::<i64>(0).map_err(backend_error)? as u64,
        key: text(row, 1)?,
        title: text(row, 2)?,
        kind: text(row, 3)?,
        attributes: text(row, 4)?,
        created_at: from_millis(row.get::<i64>(5).map_err(backend_error)?)?,
        updated_at: from_millis(row.get::<i64>(6).map_err(backend_error)?)?,
        deleted_at,
    })
}
