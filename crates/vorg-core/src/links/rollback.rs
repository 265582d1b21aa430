//! Undo a view using the transaction log

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use vorg_fs::{ArtifactKind, is_link_artifact, probe, remove_artifact, remove_empty_parents};

use super::absolute_root;
use crate::ledger::{LinkTransaction, Operation, TransactionLog};
use crate::rules::validate_view_name;
use crate::Result;

/// Outcome of one rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub batch_id: Uuid,
    pub deleted: usize,
    /// Logged links that no longer existed
    pub already_clean: usize,
    pub errors: Vec<String>,
}

enum Outcome {
    Deleted,
    AlreadyClean,
}

/// Removes the link artifacts a view's successful create rows point at.
pub struct RollbackManager<'a> {
    views_root: PathBuf,
    log: &'a mut dyn TransactionLog,
}

impl<'a> RollbackManager<'a> {
    pub fn new(views_root: impl Into<PathBuf>, log: &'a mut dyn TransactionLog) -> Self {
        Self {
            views_root: absolute_root(views_root.into()),
            log,
        }
    }

    /// Delete every logged link of `view_name` and append one summary row.
    ///
    /// Only successful, non-simulated create rows are considered. Anything
    /// at a logged path that is not a link artifact is left in place and
    /// reported.
    pub fn rollback_view(&mut self, view_name: &str) -> Result<RollbackReport> {
        validate_view_name(view_name)?;
        let batch_id = Uuid::new_v4();

        let entries = self.log.query(view_name, Some(Operation::Create))?;
        let mut seen = HashSet::new();
        let targets: Vec<_> = entries
            .into_iter()
            .filter(LinkTransaction::is_materialized)
            .filter(|e| seen.insert(e.link_path.clone()))
            .collect();

        let mut report = RollbackReport {
            batch_id,
            deleted: 0,
            already_clean: 0,
            errors: Vec::new(),
        };

        for entry in &targets {
            let link = PathBuf::from(&entry.link_path);
            match self.remove_link(&link, Path::new(&entry.source_path)) {
                Ok(Outcome::Deleted) => report.deleted += 1,
                Ok(Outcome::AlreadyClean) => report.already_clean += 1,
                Err(message) => {
                    tracing::error!(link = %entry.link_path, error = %message, "Rollback entry failed");
                    report.errors.push(message);
                }
            }
        }

        self.log.append(&LinkTransaction::rollback_summary(
            batch_id,
            view_name,
            report.deleted,
            report.already_clean,
            &report.errors,
        ))?;

        tracing::info!(
            view = view_name,
            deleted = report.deleted,
            already_clean = report.already_clean,
            errors = report.errors.len(),
            "Rollback finished"
        );
        Ok(report)
    }

    fn remove_link(&self, link: &Path, source: &Path) -> std::result::Result<Outcome, String> {
        let is_link = match probe(link).map_err(|e| format!("{}: {e}", link.display()))? {
            ArtifactKind::Missing => return Ok(Outcome::AlreadyClean),
            ArtifactKind::Link => true,
            ArtifactKind::File => is_link_artifact(link, Some(source)).unwrap_or(false),
            ArtifactKind::Directory => false,
        };
        if !is_link {
            return Err(format!("not a link: {}", link.display()));
        }

        remove_artifact(link).map_err(|e| format!("{}: {e}", link.display()))?;
        tracing::debug!(link = %link.display(), "Removed link");
        if let Some(parent) = link.parent() {
            remove_empty_parents(parent, &self.views_root);
        }
        Ok(Outcome::Deleted)
    }
}
