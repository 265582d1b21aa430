//! Append-only transaction log of link operations
//!
//! Every link attempt (real or simulated) and every rollback produces a
//! [`LinkTransaction`]. Rows are only ever appended; the log is the sole
//! source of truth for rollback.

mod memory;
mod sqlite;

pub use memory::MemoryTransactionLog;
pub use sqlite::SqliteTransactionLog;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Note attached to dry-run rows.
pub const SIMULATED_NOTE: &str = "simulated";

/// Kind of logged operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Rollback,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Rollback => "rollback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "rollback" => Some(Self::Rollback),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Technique that produced a link artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Symlink,
    Junction,
    HardLink,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Symlink => "symlink",
            Self::Junction => "junction",
            Self::HardLink => "hardlink",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "symlink" => Some(Self::Symlink),
            "junction" => Some(Self::Junction),
            "hardlink" => Some(Self::HardLink),
            _ => None,
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTransaction {
    /// Assigned by the log on append; `None` before that
    pub id: Option<i64>,
    /// Groups the rows of one `create_links` or `rollback_view` call
    pub batch_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub view_name: String,
    pub source_path: String,
    pub link_path: String,
    pub link_kind: Option<LinkKind>,
    pub success: bool,
    pub dry_run: bool,
    pub error: Option<String>,
    pub note: Option<String>,
}

impl LinkTransaction {
    /// A pending `create` row; finish it with [`succeeded`](Self::succeeded),
    /// [`failed`](Self::failed) or [`simulated`](Self::simulated).
    pub fn create(
        batch_id: Uuid,
        view_name: impl Into<String>,
        source_path: impl Into<String>,
        link_path: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            batch_id,
            timestamp: Utc::now(),
            operation: Operation::Create,
            view_name: view_name.into(),
            source_path: source_path.into(),
            link_path: link_path.into(),
            link_kind: None,
            success: false,
            dry_run: false,
            error: None,
            note: None,
        }
    }

    pub fn succeeded(mut self, kind: LinkKind) -> Self {
        self.success = true;
        self.link_kind = Some(kind);
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    pub fn simulated(mut self) -> Self {
        self.success = true;
        self.dry_run = true;
        self.note = Some(SIMULATED_NOTE.to_string());
        self
    }

    /// The single summary row written at the end of a rollback.
    pub fn rollback_summary(
        batch_id: Uuid,
        view_name: impl Into<String>,
        deleted: usize,
        already_clean: usize,
        errors: &[String],
    ) -> Self {
        Self {
            id: None,
            batch_id,
            timestamp: Utc::now(),
            operation: Operation::Rollback,
            view_name: view_name.into(),
            source_path: String::new(),
            link_path: String::new(),
            link_kind: None,
            success: deleted > 0,
            dry_run: false,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
            note: Some(format!("deleted {deleted}, already clean {already_clean}")),
        }
    }

    /// Whether this row records a link that exists on disk (as far as the
    /// log knows).
    pub fn is_materialized(&self) -> bool {
        self.operation == Operation::Create && self.success && !self.dry_run
    }
}

/// Append-only store of [`LinkTransaction`]s.
///
/// Rows can be appended and read back; there is no update or delete.
pub trait TransactionLog {
    fn append(&mut self, entry: &LinkTransaction) -> Result<()>;

    /// Append several rows; implementations may make this atomic.
    fn append_all(&mut self, entries: &[LinkTransaction]) -> Result<()> {
        entries.iter().try_for_each(|entry| self.append(entry))
    }

    /// Rows of `view_name` in append order, optionally filtered by operation.
    fn query(&self, view_name: &str, operation: Option<Operation>) -> Result<Vec<LinkTransaction>>;
}
