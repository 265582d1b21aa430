//! Command implementations for vorg-cli

pub mod generate;
pub mod history;
pub mod link;
pub mod preview;
pub mod rollback;
pub mod views;

pub use generate::run_generate;
pub use history::run_history;
pub use link::run_link;
pub use preview::run_preview;
pub use rollback::run_rollback;
pub use views::run_views;

use std::path::{Path, PathBuf};

use vorg_core::{CatalogStore, RuleSet, SqliteTransactionLog};
use vorg_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// The three locations every command works against.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub db: PathBuf,
    pub rules: PathBuf,
    pub views_root: PathBuf,
}

impl Workspace {
    pub fn new(db: PathBuf, rules: PathBuf, views_root: PathBuf) -> Self {
        Self {
            db,
            rules,
            views_root,
        }
    }

    pub fn load_rules(&self) -> Result<RuleSet> {
        if !self.rules.is_file() {
            return Err(CliError::user(format!(
                "rules file not found: {}",
                self.rules.display()
            )));
        }
        Ok(RuleSet::load(&NormalizedPath::new(&self.rules))?)
    }

    pub fn open_catalog(&self) -> Result<CatalogStore> {
        Ok(CatalogStore::open(&self.db)?)
    }

    /// The transaction log lives in the catalog database, which must exist.
    pub fn open_log(&self) -> Result<SqliteTransactionLog> {
        if !self.db.is_file() {
            return Err(CliError::user(format!(
                "catalog database not found: {}",
                self.db.display()
            )));
        }
        Ok(SqliteTransactionLog::open(&self.db)?)
    }
}

fn normalized(path: &Path) -> NormalizedPath {
    NormalizedPath::new(path)
}
