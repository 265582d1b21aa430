//! `link_transactions` table in the catalog database

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use super::{LinkKind, LinkTransaction, Operation, TransactionLog};
use crate::Result;

const TABLE: &str = "link_transactions";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS link_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    operation TEXT NOT NULL,
    view_name TEXT NOT NULL,
    source_path TEXT NOT NULL,
    link_path TEXT NOT NULL,
    success INTEGER DEFAULT 0,
    error TEXT,
    batch_id TEXT,
    link_kind TEXT,
    dry_run INTEGER NOT NULL DEFAULT 0,
    note TEXT
);
";

/// Columns added after the original table layout, with their definitions.
const ADDED_COLUMNS: &[(&str, &str)] = &[
    ("batch_id", "TEXT"),
    ("link_kind", "TEXT"),
    ("dry_run", "INTEGER NOT NULL DEFAULT 0"),
    ("note", "TEXT"),
];

const GUARDS: &str = "
CREATE INDEX IF NOT EXISTS idx_link_transactions_view
    ON link_transactions (view_name, operation);
CREATE TRIGGER IF NOT EXISTS link_transactions_no_update
    BEFORE UPDATE ON link_transactions
    BEGIN SELECT RAISE(ABORT, 'link_transactions is append-only'); END;
CREATE TRIGGER IF NOT EXISTS link_transactions_no_delete
    BEFORE DELETE ON link_transactions
    BEGIN SELECT RAISE(ABORT, 'link_transactions is append-only'); END;
";

/// Transaction log stored in SQLite.
///
/// The table is created on open. Tables written by older versions are
/// migrated by adding the missing columns; existing rows are never touched.
#[derive(Debug)]
pub struct SqliteTransactionLog {
    conn: Connection,
}

impl SqliteTransactionLog {
    /// Open (creating if necessary) the log inside the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!(db = %path.display(), "Opened transaction log");
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;
        conn.execute_batch(GUARDS)?;
        Ok(Self { conn })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (column, definition) in ADDED_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            conn.execute_batch(&format!(
                "ALTER TABLE {TABLE} ADD COLUMN {column} {definition}"
            ))?;
            tracing::info!(column, "Migrated transaction log");
        }
    }
    Ok(())
}

fn insert(conn: &Connection, entry: &LinkTransaction) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO link_transactions
            (timestamp, operation, view_name, source_path, link_path, success, error,
             batch_id, link_kind, dry_run, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.timestamp.to_rfc3339(),
            entry.operation.as_str(),
            entry.view_name,
            entry.source_path,
            entry.link_path,
            entry.success,
            entry.error,
            entry.batch_id.to_string(),
            entry.link_kind.map(LinkKind::as_str),
            entry.dry_run,
            entry.note,
        ],
    )?;
    Ok(())
}

/// Parse a stored timestamp: RFC 3339, or the naive local ISO format older
/// rows used. Unreadable values fall back to the epoch.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_default()
}

impl TransactionLog for SqliteTransactionLog {
    fn append(&mut self, entry: &LinkTransaction) -> Result<()> {
        insert(&self.conn, entry)?;
        Ok(())
    }

    fn append_all(&mut self, entries: &[LinkTransaction]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for entry in entries {
            insert(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn query(&self, view_name: &str, operation: Option<Operation>) -> Result<Vec<LinkTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, batch_id, timestamp, operation, view_name, source_path, link_path,
                    link_kind, success, dry_run, error, note
             FROM link_transactions
             WHERE view_name = ?1 AND (?2 IS NULL OR operation = ?2)
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![view_name, operation.map(Operation::as_str)], |row| {
            let op: String = row.get(3)?;
            let Some(operation) = Operation::parse(&op) else {
                tracing::debug!(operation = %op, "Skipping unknown log operation");
                return Ok(None);
            };
            let batch_id: Option<String> = row.get(1)?;
            let timestamp: String = row.get(2)?;
            let link_kind: Option<String> = row.get(7)?;
            let success: Option<i64> = row.get(8)?;
            let dry_run: Option<i64> = row.get(9)?;
            let error: Option<String> = row.get(10)?;

            Ok(Some(LinkTransaction {
                id: Some(row.get(0)?),
                batch_id: batch_id
                    .and_then(|b| Uuid::parse_str(&b).ok())
                    .unwrap_or_else(Uuid::nil),
                timestamp: parse_timestamp(&timestamp),
                operation,
                view_name: row.get(4)?,
                source_path: row.get(5)?,
                link_path: row.get(6)?,
                link_kind: link_kind.as_deref().and_then(LinkKind::parse),
                success: success.unwrap_or(0) != 0,
                dry_run: dry_run.unwrap_or(0) != 0,
                error: error.filter(|e| !e.is_empty()),
                note: row.get(11)?,
            }))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            if let Some(entry) = row? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
