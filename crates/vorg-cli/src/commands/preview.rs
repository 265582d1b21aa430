//! Preview command implementation

use std::path::Path;

use colored::Colorize;
use vorg_core::{ViewAggregator, ViewEngine};

use super::{Workspace, normalized};
use crate::error::Result;

/// Generate every view and write the preview report
pub fn run_preview(workspace: &Workspace, output: &Path) -> Result<()> {
    let rules = workspace.load_rules()?;
    let catalog = workspace.open_catalog()?;

    let report = ViewAggregator::new(ViewEngine::new(&rules, &catalog)).preview();
    report.write(&normalized(output))?;

    for view in &report.views {
        println!("  {} {} ({} files)", "+".green(), view.name.cyan(), view.count);
    }
    println!(
        "{} {} links from {} source files; report written to {}",
        "OK".green().bold(),
        report.total_links,
        report.unique_sources,
        output.display()
    );
    Ok(())
}
