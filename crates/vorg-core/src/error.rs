//! Error types for vorg-core
//!
//! Only configuration-time and storage failures surface as [`Error`].
//! Per-record evaluation problems resolve to "no match" and per-mapping
//! link failures are recorded in the transaction log instead.

use std::path::PathBuf;

/// Result type for vorg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vorg-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested view is not defined in the rule configuration
    #[error("View '{name}' not found in rules")]
    ViewNotFound { name: String },

    /// The rule configuration is structurally invalid
    #[error("Invalid rule configuration: {message}")]
    InvalidRules { message: String },

    /// A view name cannot be used as a directory under the views root
    #[error("Invalid view name '{name}': must be a single path segment")]
    InvalidViewName { name: String },

    /// The catalog database does not exist
    #[error("Catalog not found at {path}")]
    CatalogNotFound { path: PathBuf },

    /// Error reading the catalog or writing the transaction log
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from vorg-fs
    #[error(transparent)]
    Fs(#[from] vorg_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
