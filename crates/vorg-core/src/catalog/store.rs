//! SQLite-backed catalog reader

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::{FieldValue, FileRecord, RecordSource};
use crate::{Error, Result};

/// Read-only handle on the scanner's catalog database.
///
/// The handle is opened once per logical batch and passed explicitly to the
/// view engine; it never writes to the `files` table.
pub struct CatalogStore {
    conn: Connection,
    path: PathBuf,
}

impl CatalogStore {
    /// Open an existing catalog read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogNotFound`] when the file does not exist, or a
    /// database error when it cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::CatalogNotFound {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(catalog = %path.display(), "Opened catalog");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Wrap an already-open connection (used with in-memory databases).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            path: PathBuf::from(":memory:"),
        }
    }

    /// Path of the catalog database
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of catalogued files
    pub fn record_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl RecordSource for CatalogStore {
    /// Read every row of `files` in insertion order.
    ///
    /// All columns are read generically so scanner extensions (extra
    /// columns) surface as record extras. Rows without a `path` are skipped.
    fn records(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare("SELECT * FROM files ORDER BY rowid")?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt.query_map([], |row| {
            (0..columns.len())
                .map(|i| row.get_ref(i).map(field_value))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut records = Vec::new();
        for row in rows {
            let values = row?;
            let mut record = FileRecord::default();
            for (column, value) in columns.iter().zip(values) {
                record.set_field(column, value);
            }
            if record.path.is_empty() {
                tracing::warn!("Skipping catalog row without a path");
                continue;
            }
            records.push(record);
        }

        tracing::debug!(count = records.len(), "Read catalog records");
        Ok(records)
    }
}

fn field_value(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => FieldValue::Null,
        ValueRef::Integer(i) => FieldValue::Integer(i),
        ValueRef::Real(r) => FieldValue::Real(r),
        ValueRef::Text(bytes) => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}
