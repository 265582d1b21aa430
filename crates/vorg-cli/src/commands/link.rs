//! Link command implementation

use std::path::Path;

use colored::Colorize;
use vorg_core::{LinkMaterializer, Mapping, ViewEngine, load_mappings};
use vorg_fs::ViewsLock;

use super::{Workspace, normalized};
use crate::error::Result;

/// Materialize a view, from a mapping file or generated on the fly
pub fn run_link(
    workspace: &Workspace,
    view: &str,
    mappings_file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let mappings = match mappings_file {
        Some(path) => {
            let mappings = load_mappings(&normalized(path))?;
            warn_foreign_mappings(&mappings, view);
            mappings
        }
        None => {
            let rules = workspace.load_rules()?;
            rules.view(view)?;
            let catalog = workspace.open_catalog()?;
            ViewEngine::new(&rules, &catalog).generate_view(view)?
        }
    };

    let mut log = workspace.open_log()?;
    // A dry run never touches the views root, not even to create the lock
    let _lock = if dry_run {
        None
    } else {
        Some(ViewsLock::acquire(&workspace.views_root)?)
    };

    let report = LinkMaterializer::new(&workspace.views_root, &mut log)
        .create_links(&mappings, view, dry_run)?;

    if dry_run {
        println!(
            "{} Would create {} links for view {} (batch {})",
            "DRY RUN".yellow().bold(),
            report.created,
            view.cyan(),
            report.batch_id
        );
    } else {
        let status = if report.errors == 0 {
            "OK".green().bold()
        } else {
            "PARTIAL".yellow().bold()
        };
        println!(
            "{} Created {} links for view {}, {} errors (batch {})",
            status,
            report.created,
            view.cyan(),
            report.errors,
            report.batch_id
        );
        if report.errors > 0 {
            println!("Run {} for details.", format!("vorg history {view}").cyan());
        }
    }
    Ok(())
}

fn warn_foreign_mappings(mappings: &[Mapping], view: &str) {
    let foreign = mappings.iter().filter(|m| m.view_name != view).count();
    if foreign > 0 {
        tracing::warn!(
            view,
            foreign,
            "Mapping file contains entries generated for another view; linking them under this view"
        );
    }
}
