//! History command implementation

use colored::Colorize;
use vorg_core::{LinkTransaction, Operation, TransactionLog};

use super::Workspace;
use crate::error::Result;

/// Print the transaction log of a view
pub fn run_history(workspace: &Workspace, view: &str, json: bool) -> Result<()> {
    let log = workspace.open_log()?;
    let entries = log.query(view, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No transactions recorded for view {}", view.cyan());
        return Ok(());
    }

    println!("{} {}", "History of".bold(), view.cyan().bold());
    for entry in &entries {
        println!("  {}", describe(entry));
    }
    Ok(())
}

fn describe(entry: &LinkTransaction) -> String {
    let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let status = match (entry.success, entry.dry_run) {
        (true, true) => "dry-run".yellow(),
        (true, false) => "ok".green(),
        (false, _) => "failed".red(),
    };
    let detail = match entry.operation {
        Operation::Create => {
            let kind = entry.link_kind.map(|k| format!(" [{k}]")).unwrap_or_default();
            format!("{} -> {}{}", entry.source_path, entry.link_path, kind)
        }
        Operation::Rollback => entry.note.clone().unwrap_or_default(),
    };
    let error = entry
        .error
        .as_deref()
        .map(|e| format!(" ({e})"))
        .unwrap_or_default();

    format!("{when} {:<8} {:<8} {detail}{error}", entry.operation.as_str(), status)
}
