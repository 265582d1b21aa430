//! Single-view evaluation

use crate::catalog::RecordSource;
use crate::rules::{EvalContext, RuleSet};
use crate::Result;

use super::Mapping;

/// Applies a [`RuleSet`] to a [`RecordSource`].
pub struct ViewEngine<'a> {
    rules: &'a RuleSet,
    source: &'a dyn RecordSource,
    ctx: EvalContext,
}

impl<'a> ViewEngine<'a> {
    /// Create an engine evaluating relative to the current time.
    pub fn new(rules: &'a RuleSet, source: &'a dyn RecordSource) -> Self {
        Self {
            rules,
            source,
            ctx: EvalContext::now(),
        }
    }

    /// Pin the evaluation context (e.g. for reproducible runs).
    pub fn with_context(mut self, ctx: EvalContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    pub fn context(&self) -> EvalContext {
        self.ctx
    }

    /// Compute the mappings of one view.
    ///
    /// Fails with `ViewNotFound` before the catalog is read. Each record
    /// yields at most one mapping, in catalog order.
    pub fn generate_view(&self, view_name: &str) -> Result<Vec<Mapping>> {
        let view = self.rules.view(view_name)?;
        let records = self.source.records()?;

        let mappings: Vec<Mapping> = records
            .iter()
            .filter_map(|record| {
                let target = view.resolve(record, &self.ctx);
                if target.is_none() {
                    tracing::debug!(view = view_name, path = %record.path, "No rule matched");
                }
                target.map(|target| Mapping::new(&record.path, target, view_name))
            })
            .collect();

        tracing::info!(
            view = view_name,
            records = records.len(),
            mappings = mappings.len(),
            "Generated view"
        );
        Ok(mappings)
    }
}
