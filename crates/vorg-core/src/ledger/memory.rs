//! In-memory transaction log

use super::{LinkTransaction, Operation, TransactionLog};
use crate::Result;

/// Transaction log kept in a `Vec`, for tests and embedding without a
/// database.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransactionLog {
    entries: Vec<LinkTransaction>,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows in append order.
    pub fn entries(&self) -> &[LinkTransaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TransactionLog for MemoryTransactionLog {
    fn append(&mut self, entry: &LinkTransaction) -> Result<()> {
        let mut entry = entry.clone();
        entry.id = Some(self.entries.len() as i64 + 1);
        self.entries.push(entry);
        Ok(())
    }

    fn query(&self, view_name: &str, operation: Option<Operation>) -> Result<Vec<LinkTransaction>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.view_name == view_name)
            .filter(|e| operation.is_none_or(|op| e.operation == op))
            .cloned()
            .collect())
    }
}
