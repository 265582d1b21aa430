//! Raw rule document as it appears on disk

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top level of the rules file: `views: { <name>: { rules: [...] } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesDocument {
    #[serde(default)]
    pub views: BTreeMap<String, ViewDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Any condition shape; compiled by [`Condition::compile`](super::Condition::compile)
    #[serde(default)]
    pub condition: Value,
    #[serde(default)]
    pub target: Option<String>,
}
