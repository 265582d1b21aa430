//! Rollback command implementation

use colored::Colorize;
use vorg_core::RollbackManager;
use vorg_fs::ViewsLock;

use super::Workspace;
use crate::error::Result;

/// Remove every link logged for a view
pub fn run_rollback(workspace: &Workspace, view: &str) -> Result<()> {
    let mut log = workspace.open_log()?;
    let _lock = ViewsLock::acquire(&workspace.views_root)?;

    let report = RollbackManager::new(&workspace.views_root, &mut log).rollback_view(view)?;

    println!(
        "{} Removed {} links for view {} ({} already gone)",
        "OK".green().bold(),
        report.deleted,
        view.cyan(),
        report.already_clean
    );
    for error in &report.errors {
        println!("  {} {}", "!".red(), error);
    }
    Ok(())
}
