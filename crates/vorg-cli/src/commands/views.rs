//! Views command implementation

use colored::Colorize;

use super::Workspace;
use crate::error::Result;

/// List the configured views with their rule counts
pub fn run_views(workspace: &Workspace) -> Result<()> {
    let rules = workspace.load_rules()?;

    if rules.is_empty() {
        println!("{}", "No views configured".yellow());
        return Ok(());
    }

    println!("{}", "Views".bold());
    for view in rules.views() {
        let count = format!("{} rules", view.rules.len());
        match &view.description {
            Some(description) => println!(
                "  {} {} ({}) - {}",
                "+".green(),
                view.name.cyan(),
                count.dimmed(),
                description
            ),
            None => println!("  {} {} ({})", "+".green(), view.name.cyan(), count.dimmed()),
        }
    }
    Ok(())
}
