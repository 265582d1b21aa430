//! All-views generation

use std::collections::BTreeMap;

use super::{Mapping, PreviewReport, ViewEngine};

/// Mappings of every view, keyed by view name.
pub type ViewMappings = BTreeMap<String, Vec<Mapping>>;

/// Runs the engine over every configured view.
pub struct ViewAggregator<'a> {
    engine: ViewEngine<'a>,
}

impl<'a> ViewAggregator<'a> {
    pub fn new(engine: ViewEngine<'a>) -> Self {
        Self { engine }
    }

    /// Generate every view. A view that fails is logged and contributes an
    /// empty list; it never aborts the others.
    pub fn generate_all_views(&self) -> ViewMappings {
        self.engine
            .rules()
            .views()
            .map(|view| {
                let mappings = self
                    .engine
                    .generate_view(&view.name)
                    .unwrap_or_else(|e| {
                        tracing::error!(view = %view.name, error = %e, "View generation failed");
                        Vec::new()
                    });
                (view.name.clone(), mappings)
            })
            .collect()
    }

    /// Generate every view and summarize the result.
    pub fn preview(&self) -> PreviewReport {
        PreviewReport::build(&self.generate_all_views())
    }
}
