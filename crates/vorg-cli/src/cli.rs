//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vorg_fs::VorgPath;

/// vorg - Virtual file organizer
///
/// Builds rule-driven virtual folder views over a file catalog and
/// materializes them as links, without moving or copying originals.
#[derive(Parser, Debug)]
#[command(name = "vorg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Catalog database produced by the scanner
    #[arg(long, global = true, env = "VORG_DB", default_value = VorgPath::CatalogDb.as_str())]
    pub db: PathBuf,

    /// Rules file (YAML, JSON or TOML)
    #[arg(long, global = true, env = "VORG_RULES", default_value = VorgPath::RulesFile.as_str())]
    pub rules: PathBuf,

    /// Directory under which views are materialized
    #[arg(long, global = true, env = "VORG_VIEWS_ROOT", default_value = VorgPath::ViewsRoot.as_str())]
    pub views_root: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the configured views
    Views,

    /// Compute one view's mappings and write them to a file
    Generate {
        /// View name
        view: String,

        /// Mapping file to write
        #[arg(short, long, default_value = "mappings.json")]
        output: PathBuf,
    },

    /// Generate every view and write a preview report
    ///
    /// The format follows the extension: .html/.htm for HTML, .json for
    /// JSON, anything else for plain text.
    Preview {
        /// Report file to write
        #[arg(short, long, default_value = "dryrun_report.html")]
        output: PathBuf,
    },

    /// Create the links of a view
    ///
    /// Examples:
    ///   vorg link ByCategory --dry-run
    ///   vorg link ByCategory --mappings mappings.json
    Link {
        /// View name
        view: String,

        /// Mapping file from `vorg generate` (generated on the fly if omitted)
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Log what would be linked without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove every link previously created for a view
    Rollback {
        /// View name
        view: String,
    },

    /// Show the transaction log of a view
    History {
        /// View name
        view: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
