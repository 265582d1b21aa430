//! [`TestCatalog`]: a scanner-shaped SQLite catalog in a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use tempfile::TempDir;

/// `files` table as created by the scanner.
pub const FILES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    extension TEXT,
    size INTEGER,
    created REAL,
    modified REAL,
    accessed REAL,
    attributes INTEGER,
    hash_sha256 TEXT,
    category TEXT,
    subcategory TEXT,
    tags TEXT,
    project TEXT,
    software TEXT,
    version TEXT,
    extra_json TEXT,
    indexed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
";

/// Builder for one row of the `files` table.
#[derive(Debug, Clone, Default)]
pub struct CatalogRow {
    pub path: String,
    pub name: String,
    pub extension: Option<String>,
    pub size: Option<i64>,
    pub created: Option<f64>,
    pub modified: Option<f64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Option<String>,
    pub project: Option<String>,
}

impl CatalogRow {
    /// Row for `path` with `name` and a lowercase `.ext` derived from it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            path: path.to_string_lossy().into_owned(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase())),
            ..Self::default()
        }
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn created(mut self, created: f64) -> Self {
        self.created = Some(created);
        self
    }

    pub fn modified(mut self, modified: f64) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }

    pub fn tags(mut self, tags: &str) -> Self {
        self.tags = Some(tags.to_string());
        self
    }

    pub fn project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }
}

/// A temporary directory holding a catalog database, a library of real
/// source files, a rules file location and a views root.
///
/// # Example
///
/// ```rust,no_run
/// use vorg_test_utils::{CatalogRow, TestCatalog};
///
/// let catalog = TestCatalog::new();
/// let source = catalog.add_file("docs/a.pdf", "pdf bytes");
/// catalog.insert(&CatalogRow::new(&source).category("Documents"));
/// catalog.write_rules("views:\n  All:\n    rules:\n      - target: \"{name}\"\n");
/// ```
pub struct TestCatalog {
    temp_dir: TempDir,
    conn: Connection,
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCatalog {
    /// Create the directory and an empty `files` table.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("catalog.db")).unwrap();
        conn.execute_batch(FILES_SCHEMA).unwrap();
        Self { temp_dir, conn }
    }

    /// Root of the temporary directory (canonical, so link targets compare
    /// equal to what the organizer resolves).
    pub fn root(&self) -> PathBuf {
        dunce::canonicalize(self.temp_dir.path()).unwrap()
    }

    pub fn db_path(&self) -> PathBuf {
        self.root().join("catalog.db")
    }

    pub fn views_root(&self) -> PathBuf {
        self.root().join("_Views")
    }

    pub fn library(&self) -> PathBuf {
        self.root().join("library")
    }

    pub fn rules_path(&self) -> PathBuf {
        self.root().join("config").join("views.yaml")
    }

    /// Create a real file under the library and return its absolute path.
    pub fn add_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.library().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Create a real directory under the library and return its path.
    pub fn add_dir(&self, relative: &str) -> PathBuf {
        let path = self.library().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Insert a row into `files`, returning its id.
    pub fn insert(&self, row: &CatalogRow) -> i64 {
        self.conn
            .execute(
                "INSERT INTO files
                    (path, name, extension, size, created, modified,
                     category, subcategory, tags, project)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.path,
                    row.name,
                    row.extension,
                    row.size,
                    row.created,
                    row.modified,
                    row.category,
                    row.subcategory,
                    row.tags,
                    row.project,
                ],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    /// Create a real file and catalog it in one step.
    pub fn add_record(&self, relative: &str, content: &str, category: &str) -> PathBuf {
        let path = self.add_file(relative, content);
        self.insert(
            &CatalogRow::new(&path)
                .size(content.len() as i64)
                .category(category),
        );
        path
    }

    /// Write the rules file and return its path.
    pub fn write_rules(&self, content: &str) -> PathBuf {
        let path = self.rules_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Number of rows in `link_transactions` (0 if the table does not exist).
    pub fn transaction_count(&self) -> i64 {
        self.conn
            .query_row("SELECT COUNT(*) FROM link_transactions", [], |row| row.get(0))
            .unwrap_or(0)
    }
}
