//! Read-only access to the scanner's file catalog
//!
//! The scanner and categorizer own the `files` table; the organizer only
//! reads it. [`RecordSource`] is the seam between the view engine and the
//! store so the engine can be driven from SQLite or from in-memory records.

mod record;
mod store;

pub use record::{FieldValue, FileRecord};
pub use store::CatalogStore;

use crate::Result;

/// Anything that can produce the catalogued file records, in a stable order.
pub trait RecordSource {
    /// Read every record. Ordering must be deterministic across calls.
    fn records(&self) -> Result<Vec<FileRecord>>;
}

impl RecordSource for [FileRecord] {
    fn records(&self) -> Result<Vec<FileRecord>> {
        Ok(self.to_vec())
    }
}

impl RecordSource for Vec<FileRecord> {
    fn records(&self) -> Result<Vec<FileRecord>> {
        Ok(self.clone())
    }
}
