//! Declarative rules: conditions, templates and views
//!
//! A [`RuleSet`] is loaded once from the rules file and compiled eagerly.
//! Structural problems (no target, unusable view name) are fatal; problems
//! inside a single condition only make that rule unmatchable.

mod condition;
mod config;
mod expr;
mod template;

pub use condition::{ALL_OF, ANY_OF, Condition, EvalContext, Matcher, Scalar};
pub use config::{RuleDefinition, RulesDocument, ViewDefinition};
pub use expr::{CompareExpr, CompareOp, Comparison, Operand, ParseError};
pub use template::{Template, sanitize};

use std::collections::BTreeMap;

use vorg_fs::config::Format;
use vorg_fs::{ConfigStore, NormalizedPath};

use crate::catalog::FileRecord;
use crate::{Error, Result};

/// One entry of a view's decision list.
#[derive(Debug, Clone)]
pub struct Rule {
    pub condition: Condition,
    pub template: Template,
}

impl Rule {
    /// Target path for `record`, or `None` if the condition fails or the
    /// template renders to nothing.
    pub fn apply(&self, record: &FileRecord, ctx: &EvalContext) -> Option<String> {
        if !self.condition.matches(record, ctx) {
            return None;
        }
        let target = self.template.render(record);
        if target.is_empty() {
            tracing::debug!(
                path = %record.path,
                template = %self.template,
                "Template rendered empty, trying next rule"
            );
            return None;
        }
        Some(target)
    }
}

/// A named, ordered decision list.
#[derive(Debug, Clone)]
pub struct View {
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<Rule>,
}

impl View {
    /// First matching rule wins.
    pub fn resolve(&self, record: &FileRecord, ctx: &EvalContext) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(record, ctx))
    }
}

/// All configured views, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    views: BTreeMap<String, View>,
}

impl RuleSet {
    /// Load and compile a rules file (YAML, JSON or TOML by extension).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let document: RulesDocument = ConfigStore::new().load(path)?;
        tracing::debug!(path = %path, views = document.views.len(), "Loaded rules");
        Self::from_document(document)
    }

    /// Compile rules from an in-memory document string.
    pub fn parse(content: &str, format: Format) -> Result<Self> {
        let document: RulesDocument =
            ConfigStore::new().parse(&NormalizedPath::new("<inline>"), format, content)?;
        Self::from_document(document)
    }

    pub fn from_document(document: RulesDocument) -> Result<Self> {
        let mut views = BTreeMap::new();
        for (name, definition) in document.views {
            validate_view_name(&name)?;
            let rules = definition
                .rules
                .into_iter()
                .enumerate()
                .map(|(index, rule)| compile_rule(&name, index, rule))
                .collect::<Result<Vec<_>>>()?;
            views.insert(
                name.clone(),
                View {
                    name,
                    description: definition.description,
                    rules,
                },
            );
        }
        Ok(Self { views })
    }

    /// Look up a view, failing with [`Error::ViewNotFound`].
    pub fn view(&self, name: &str) -> Result<&View> {
        self.views.get(name).ok_or_else(|| Error::ViewNotFound {
            name: name.to_string(),
        })
    }

    /// Views in name order.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn view_names(&self) -> Vec<String> {
        self.views.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

fn compile_rule(view: &str, index: usize, rule: RuleDefinition) -> Result<Rule> {
    let target = rule
        .target
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::InvalidRules {
            message: format!("view '{view}' rule {} has no target", index + 1),
        })?;
    Ok(Rule {
        condition: Condition::compile(&rule.condition),
        template: Template::parse(target),
    })
}

/// A view name becomes a directory under the views root, so it must be a
/// single, ordinary path segment.
pub fn validate_view_name(name: &str) -> Result<()> {
    let usable = !name.trim().is_empty() && sanitize(name) == name;
    if usable {
        Ok(())
    } else {
        Err(Error::InvalidViewName {
            name: name.to_string(),
        })
    }
}
