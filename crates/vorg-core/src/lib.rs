//! Rule engine and link materializer for the virtual file organizer
//!
//! `vorg-core` turns catalogued file metadata into virtual directory
//! structures and materializes them as filesystem links:
//!
//! - **Catalog**: read-only access to the scanner's `files` table
//! - **Rules**: condition evaluation and path-template rendering, compiled
//!   once from the declarative rule document
//! - **Views**: first-match-wins evaluation per view, aggregation across all
//!   views and the preview report
//! - **Ledger**: the append-only transaction log of every link attempt
//! - **Links**: the per-source-kind strategy ladder, the materializer and the
//!   rollback manager
//!
//! # Architecture
//!
//! ```text
//!   catalog (files) --> rules --> views --> links --> ledger
//!                                                       |
//!                                 rollback  <-----------+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use vorg_core::{CatalogStore, LinkMaterializer, RuleSet, SqliteTransactionLog, ViewEngine};
//! use vorg_fs::NormalizedPath;
//!
//! fn example() -> vorg_core::Result<()> {
//!     let rules = RuleSet::load(&NormalizedPath::new("config/views.yaml"))?;
//!     let catalog = CatalogStore::open("catalog.db".as_ref())?;
//!     let mappings = ViewEngine::new(&rules, &catalog).generate_view("ByCategory")?;
//!
//!     let mut log = SqliteTransactionLog::open("catalog.db".as_ref())?;
//!     let report = LinkMaterializer::new("_Views", &mut log)
//!         .create_links(&mappings, "ByCategory", true)?;
//!     println!("would create {} links", report.created);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod links;
pub mod rules;
pub mod views;

pub use catalog::{CatalogStore, FieldValue, FileRecord, RecordSource};
pub use error::{Error, Result};
pub use ledger::{
    LinkKind, LinkTransaction, MemoryTransactionLog, Operation, SqliteTransactionLog,
    TransactionLog,
};
pub use links::{
    LinkMaterializer, LinkReport, LinkStrategy, RollbackManager, RollbackReport, SourceKind,
    StrategyLadder,
};
pub use rules::{Condition, EvalContext, Rule, RuleSet, Template, View};
pub use views::{
    Mapping, PreviewReport, ViewAggregator, ViewEngine, ViewMappings, load_mappings, save_mappings,
};
