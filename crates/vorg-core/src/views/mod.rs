//! View generation: rules applied to catalog records
//!
//! - [`ViewEngine`] evaluates one view's decision list over every record
//! - [`ViewAggregator`] runs every configured view and builds the
//!   [`PreviewReport`]
//! - [`Mapping`] is the unit handed to the link materializer

mod aggregator;
mod engine;
mod report;

pub use aggregator::{ViewAggregator, ViewMappings};
pub use engine::ViewEngine;
pub use report::{PREVIEW_ROW_LIMIT, PreviewReport, ViewSummary};

use serde::{Deserialize, Serialize};
use vorg_fs::{ConfigStore, NormalizedPath};

use crate::Result;

/// One planned link: `source_path` appears at `target_path` inside a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source_path: String,
    /// Relative to the view directory
    pub target_path: String,
    pub view_name: String,
}

impl Mapping {
    pub fn new(
        source_path: impl Into<String>,
        target_path: impl Into<String>,
        view_name: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            view_name: view_name.into(),
        }
    }
}

/// Write mappings to an interchange file (JSON, or YAML by extension).
pub fn save_mappings(path: &NormalizedPath, mappings: &[Mapping]) -> Result<()> {
    ConfigStore::new().save(path, &mappings)?;
    tracing::info!(path = %path, count = mappings.len(), "Wrote mappings");
    Ok(())
}

/// Read mappings previously written by [`save_mappings`].
pub fn load_mappings(path: &NormalizedPath) -> Result<Vec<Mapping>> {
    Ok(ConfigStore::new().load(path)?)
}
