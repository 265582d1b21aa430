//! Default locations used by the organizer.

use std::path::Path;

/// Well-known default paths, relative to the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VorgPath {
    /// The SQLite catalog produced by the scanner
    CatalogDb,
    /// The declarative view/rule document
    RulesFile,
    /// Root directory under which every view is materialized
    ViewsRoot,
    /// Advisory lock file inside the views root
    LockFile,
}

impl VorgPath {
    /// Get the string representation of the path.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CatalogDb => "catalog.db",
            Self::RulesFile => "config/views.yaml",
            Self::ViewsRoot => "_Views",
            Self::LockFile => ".vorg.lock",
        }
    }
}

impl AsRef<Path> for VorgPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for VorgPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
