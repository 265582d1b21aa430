//! Generate command implementation

use std::path::Path;

use colored::Colorize;
use vorg_core::{ViewEngine, save_mappings};

use super::{Workspace, normalized};
use crate::error::Result;

/// Compute a view's mappings and write them as JSON
pub fn run_generate(workspace: &Workspace, view: &str, output: &Path) -> Result<()> {
    let rules = workspace.load_rules()?;
    rules.view(view)?;
    let catalog = workspace.open_catalog()?;

    let mappings = ViewEngine::new(&rules, &catalog).generate_view(view)?;
    save_mappings(&normalized(output), &mappings)?;

    println!(
        "{} {} mappings for view {} written to {}",
        "OK".green().bold(),
        mappings.len(),
        view.cyan(),
        output.display()
    );
    Ok(())
}
