//! Link materialization and rollback
//!
//! The [`LinkMaterializer`] turns mappings into link artifacts under
//! `<views_root>/<view_name>/`, trying each [`LinkStrategy`] of the
//! [`StrategyLadder`] in turn, and logs exactly one row per mapping. The
//! [`RollbackManager`] reads those rows back and removes what was created.

mod materializer;
mod rollback;
mod strategy;

pub use materializer::{LinkMaterializer, LinkReport};
pub use rollback::{RollbackManager, RollbackReport};
pub use strategy::{
    HardLinkStrategy, JunctionStrategy, LinkStrategy, PRIVILEGE_HINT, SourceKind, StrategyLadder,
    SymlinkStrategy, junction_error,
};

use std::path::{Path, PathBuf};

/// Absolute form of `root` so logged link paths stay valid regardless of
/// the working directory of a later rollback.
fn absolute_root(root: PathBuf) -> PathBuf {
    std::path::absolute(&root).unwrap_or(root)
}

fn display(path: &Path) -> String {
    vorg_fs::NormalizedPath::new(path).to_string()
}
