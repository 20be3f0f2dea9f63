use crate::domain::model::{Category, HistoryRecord};
use crate::domain::ports::HistoryStore;
use crate::utils::error::{DeskError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_HISTORY_TABLE: &str = "CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    category TEXT NOT NULL,
    payload TEXT NOT NULL
)";

/// SQLite-backed history log.
///
/// Only the path is kept; every operation opens its own connection and drops
/// it before returning, so separate processes can share one file.
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteHistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            busy_timeout: BUSY_TIMEOUT,
        }
    }

    /// How long an operation waits on a lock held by another connection.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .map_err(|e| DeskError::storage("opening history database", e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| DeskError::storage("configuring history database", e))?;
        Ok(conn)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    let timestamp: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let category: String = row.get(2)?;
    let category = category.parse::<Category>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(HistoryRecord {
        id: row.get(0)?,
        timestamp,
        category,
        payload: row.get(3)?,
    })
}

impl HistoryStore for SqliteHistoryStore {
    fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DeskError::StorageUnavailable {
                    message: format!("creating {}: {}", parent.display(), e),
                    source: None,
                })?;
            }
        }

        let conn = self.open()?;

        // WAL lets readers proceed while another process appends
        let _: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| DeskError::storage("configuring history database", e))?;

        conn.execute(CREATE_HISTORY_TABLE, [])
            .map_err(|e| DeskError::storage("creating history table", e))?;

        tracing::debug!("History table ready at {}", self.path.display());
        Ok(())
    }

    fn append(&self, category: Category, payload: &str) -> Result<HistoryRecord> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| DeskError::storage("writing history record", e))?;

        let record = tx
            .query_row(
                "INSERT INTO history (category, payload) VALUES (?1, ?2)
                 RETURNING id, timestamp, category, payload",
                params![category.as_str(), payload],
                record_from_row,
            )
            .map_err(|e| DeskError::storage("writing history record", e))?;

        // The record only exists once the commit succeeds.
        tx.commit()
            .map_err(|e| DeskError::storage("committing history record", e))?;

        tracing::debug!("Saved history record #{} ({})", record.id, record.category);
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<HistoryRecord>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, category, payload FROM history
                 ORDER BY timestamp DESC, id DESC",
            )
            .map_err(|e| DeskError::storage("reading history", e))?;

        let records = stmt
            .query_map([], record_from_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| DeskError::storage("reading history", e))?;

        Ok(records)
    }
}

/// Writes records as `id,timestamp,category,payload` CSV.
pub fn export_csv<W: Write>(records: &[HistoryRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
