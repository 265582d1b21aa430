//! Condition AST and evaluation
//!
//! Conditions are compiled once from the configuration value into a typed
//! tree. Evaluation is total: anything that cannot be evaluated (missing
//! field, non-numeric operand, bad pattern) is simply "no match".

use regex::Regex;
use serde_json::Value;

use super::expr::CompareExpr;
use crate::catalog::{FieldValue, FileRecord};

/// Mapping key whose array value compiles to a disjunction.
pub const ANY_OF: &str = "any_of";
/// Mapping key whose array value compiles to a conjunction.
pub const ALL_OF: &str = "all_of";

/// Values captured once per generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    /// Evaluation timestamp in epoch seconds
    pub now: f64,
}

impl EvalContext {
    /// Context for the current wall-clock time.
    pub fn now() -> Self {
        Self::at(chrono::Utc::now().timestamp_millis() as f64 / 1000.0)
    }

    /// Context pinned to a fixed timestamp.
    pub fn at(now: f64) -> Self {
        Self { now }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::now()
    }
}

/// Configured scalar to compare a field against exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    fn matches(&self, actual: Option<&FieldValue>) -> bool {
        let actual = actual.filter(|v| !v.is_null());
        match (self, actual) {
            (Self::Null, None) => true,
            (_, None) | (Self::Null, Some(_)) => false,
            (Self::Text(expected), Some(FieldValue::Text(actual))) => {
                actual.to_lowercase() == expected.to_lowercase()
            }
            (Self::Text(_), Some(_)) => false,
            (Self::Number(expected), Some(actual)) => numeric(actual) == Some(*expected),
            (Self::Bool(expected), Some(actual)) => {
                numeric(actual) == Some(if *expected { 1.0 } else { 0.0 })
            }
        }
    }
}

/// Numeric columns only; text never equals a number.
fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Real(r) => Some(*r),
        FieldValue::Text(_) | FieldValue::Null => None,
    }
}

/// How a literal condition tests its field.
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(Scalar),
    /// Regex or glob, tested against the stringified value
    Pattern(Regex),
}

/// Compiled condition tree.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Absent or empty condition
    Always,
    Constant(bool),
    Literal {
        field: String,
        matcher: Matcher,
    },
    /// Comparison expression; `field` is the left-hand side for leaves that
    /// do not name their own
    Expression {
        field: Option<String>,
        expr: CompareExpr,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Compile a configuration value.
    ///
    /// Never fails. Invalid parts are reported with `tracing::warn!` and
    /// compile to `Constant(false)` so the owning rule can never match.
    pub fn compile(value: &Value) -> Self {
        match value {
            Value::Null => Self::Always,
            Value::Bool(b) => Self::Constant(*b),
            Value::Number(n) => Self::Constant(n.as_f64().is_some_and(|n| n != 0.0)),
            Value::String(s) if s.trim().is_empty() => Self::Always,
            Value::String(s) => compile_bare_expression(s),
            Value::Array(items) => all(items.iter().map(Self::compile).collect()),
            Value::Object(map) => all(
                map.iter()
                    .map(|(key, expected)| match key.as_str() {
                        ANY_OF => compile_group(key, expected, Self::Or),
                        ALL_OF => compile_group(key, expected, Self::And),
                        field => compile_expected(field, expected),
                    })
                    .collect(),
            ),
        }
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &FileRecord, ctx: &EvalContext) -> bool {
        match self {
            Self::Always => true,
            Self::Constant(b) => *b,
            Self::Literal { field, matcher } => {
                let actual = record.field(field);
                match matcher {
                    Matcher::Exact(expected) => expected.matches(actual.as_ref()),
                    Matcher::Pattern(re) => {
                        let text = actual.map(|v| v.to_string()).unwrap_or_default();
                        re.is_match(&text)
                    }
                }
            }
            Self::Expression { field, expr } => expr.evaluate(field.as_deref(), record, ctx),
            Self::And(items) => items.iter().all(|c| c.matches(record, ctx)),
            Self::Or(items) => items.iter().any(|c| c.matches(record, ctx)),
        }
    }
}

fn all(mut items: Vec<Condition>) -> Condition {
    match items.len() {
        0 => Condition::Always,
        1 => items.remove(0),
        _ => Condition::And(items),
    }
}

fn never(reason: impl std::fmt::Display) -> Condition {
    tracing::warn!("Condition can never match: {}", reason);
    Condition::Constant(false)
}

fn compile_bare_expression(expr: &str) -> Condition {
    match CompareExpr::parse(expr).and_then(|parsed| parsed.require_fields().map(|()| parsed)) {
        Ok(expr) => Condition::Expression { field: None, expr },
        Err(e) => never(format_args!("'{expr}': {e}")),
    }
}

fn compile_group(key: &str, value: &Value, wrap: fn(Vec<Condition>) -> Condition) -> Condition {
    match value {
        Value::Array(items) => wrap(items.iter().map(Condition::compile).collect()),
        other => never(format_args!("'{key}' expects a list, got {other}")),
    }
}

fn compile_expected(field: &str, expected: &Value) -> Condition {
    let exact = |scalar| Condition::Literal {
        field: field.to_string(),
        matcher: Matcher::Exact(scalar),
    };
    match expected {
        Value::Null => exact(Scalar::Null),
        Value::Bool(b) => exact(Scalar::Bool(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(n) => exact(Scalar::Number(n)),
            None => never(format_args!("'{field}': unrepresentable number {n}")),
        },
        Value::String(s) => compile_string(field, s),
        // A list of candidates: any of them
        Value::Array(options) => Condition::Or(
            options
                .iter()
                .map(|option| compile_expected(field, option))
                .collect(),
        ),
        Value::Object(_) => never(format_args!("'{field}': nested mappings are not supported")),
    }
}

fn compile_string(field: &str, expected: &str) -> Condition {
    if CompareExpr::looks_like_comparison(expected) {
        return match CompareExpr::parse(expected) {
            Ok(expr) => Condition::Expression {
                field: Some(field.to_string()),
                expr,
            },
            Err(e) => never(format_args!("'{field}: {expected}': {e}")),
        };
    }

    let pattern = if expected.len() >= 2 && expected.starts_with('/') && expected.ends_with('/') {
        Some(format!("(?i)^(?:{})", &expected[1..expected.len() - 1]))
    } else if expected.contains('*') {
        Some(format!("(?i)^{}$", regex::escape(expected).replace(r"\*", ".*")))
    } else {
        None
    };

    match pattern {
        Some(pattern) => match Regex::new(&pattern) {
            Ok(re) => Condition::Literal {
                field: field.to_string(),
                matcher: Matcher::Pattern(re),
            },
            Err(e) => never(format_args!("'{field}: {expected}': invalid pattern: {e}")),
        },
        None => Condition::Literal {
            field: field.to_string(),
            matcher: Matcher::Exact(Scalar::Text(expected.to_string())),
        },
    }
}
