//! Comparison expressions such as `">= 102400"` or `"< now - 30 days"`
//!
//! Grammar (single level, no grouping):
//!
//! ```text
//! expr    := clause (" and " clause)*
//! clause  := leaf (" or " leaf)*
//! leaf    := [field] op rhs
//! op      := "<=" | ">=" | "==" | "!=" | "<" | ">"
//! rhs     := "now" "-" N ("day" | "days") | "now" | number | field | text
//! ```
//!
//! The string is split on `" and "` first and each part on `" or "`, purely
//! textually. Parentheses are rejected rather than guessed at.

use super::condition::EvalContext;
use crate::catalog::FileRecord;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Why an expression string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no comparison operator in '{0}'")]
    MissingOperator(String),

    #[error("missing right-hand side in '{0}'")]
    MissingOperand(String),

    #[error("parenthesized expressions are not supported")]
    Grouping,

    /// A leaf had no field and no default field applies
    #[error("no field to compare in '{0}'")]
    MissingField(String),
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    // Two-character operators first so `<=` is never read as `<` then `=`.
    const TOKENS: [(&'static str, CompareOp); 6] = [
        ("<=", CompareOp::Le),
        (">=", CompareOp::Ge),
        ("==", CompareOp::Eq),
        ("!=", CompareOp::Ne),
        ("<", CompareOp::Lt),
        (">", CompareOp::Gt),
    ];

    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    /// The evaluation timestamp
    Now,
    /// The evaluation timestamp minus this many days
    DaysAgo(u64),
    /// Another field of the same record
    Field(String),
    /// Anything else; never numeric, so comparisons against it are false
    Raw(String),
}

impl Operand {
    fn parse(rhs: &str) -> Self {
        let rhs = rhs.trim();
        if let Some(days) = parse_days_ago(rhs) {
            return Self::DaysAgo(days);
        }
        if rhs.eq_ignore_ascii_case("now") {
            return Self::Now;
        }
        if let Ok(i) = rhs.parse::<i64>() {
            return Self::Number(i as f64);
        }
        if let Ok(f) = rhs.parse::<f64>() {
            return Self::Number(f);
        }
        if is_identifier(rhs) {
            return Self::Field(rhs.to_string());
        }
        Self::Raw(rhs.to_string())
    }

    fn resolve(&self, record: &FileRecord, ctx: &EvalContext) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Now => Some(ctx.now),
            Self::DaysAgo(days) => Some(ctx.now - *days as f64 * SECONDS_PER_DAY),
            Self::Field(name) => record.field(name).and_then(|v| v.as_number()),
            Self::Raw(_) => None,
        }
    }
}

/// `now - N day(s)`, case-insensitive, whitespace-tolerant
fn parse_days_ago(rhs: &str) -> Option<u64> {
    let lower = rhs.to_ascii_lowercase();
    let rest = lower.strip_prefix("now")?.trim_start();
    let rest = rest.strip_prefix('-')?.trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let days = rest[..digits_end].parse().ok()?;
    match rest[digits_end..].trim() {
        "day" | "days" => Some(days),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A single `[field] op rhs` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field named inside the leaf; overrides the default field
    pub field: Option<String>,
    pub op: CompareOp,
    pub rhs: Operand,
}

impl Comparison {
    fn parse(leaf: &str) -> Result<Self, ParseError> {
        let leaf = leaf.trim();

        let ident_len = leaf
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(leaf.len());
        let (field, rest) = if ident_len > 0 && is_identifier(&leaf[..ident_len]) {
            (Some(leaf[..ident_len].to_string()), leaf[ident_len..].trim_start())
        } else {
            (None, leaf)
        };

        let (op, rhs) = CompareOp::TOKENS
            .iter()
            .find_map(|(token, op)| rest.strip_prefix(token).map(|rhs| (*op, rhs)))
            .ok_or_else(|| ParseError::MissingOperator(leaf.to_string()))?;

        if rhs.trim().is_empty() {
            return Err(ParseError::MissingOperand(leaf.to_string()));
        }

        Ok(Self {
            field,
            op,
            rhs: Operand::parse(rhs),
        })
    }

    fn evaluate(&self, default_field: Option<&str>, record: &FileRecord, ctx: &EvalContext) -> bool {
        let Some(field) = self.field.as_deref().or(default_field) else {
            return false;
        };
        let lhs = record.field(field).and_then(|v| v.as_number());
        let rhs = self.rhs.resolve(record, ctx);
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => self.op.apply(lhs, rhs),
            _ => false,
        }
    }
}

/// Parsed comparison expression
#[derive(Debug, Clone, PartialEq)]
pub enum CompareExpr {
    Leaf(Comparison),
    All(Vec<CompareExpr>),
    Any(Vec<CompareExpr>),
}

impl CompareExpr {
    /// Parse an expression string.
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        let expr = expr.trim();
        if expr.contains(['(', ')']) {
            return Err(ParseError::Grouping);
        }

        let clauses = expr
            .split(" and ")
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(collapse(clauses, Self::All))
    }

    /// Whether a string looks like a field-less comparison (`">= 5"`).
    pub fn looks_like_comparison(s: &str) -> bool {
        s.trim_start().starts_with(['<', '>', '=', '!'])
    }

    /// Ensure every leaf names its own field (for bare-string conditions).
    pub fn require_fields(&self) -> Result<(), ParseError> {
        match self {
            Self::Leaf(leaf) if leaf.field.is_none() => {
                Err(ParseError::MissingField(format!("{:?} {:?}", leaf.op, leaf.rhs)))
            }
            Self::Leaf(_) => Ok(()),
            Self::All(items) | Self::Any(items) => {
                items.iter().try_for_each(|item| item.require_fields())
            }
        }
    }

    /// Evaluate against `record`; leaves without a field use `default_field`.
    pub fn evaluate(&self, default_field: Option<&str>, record: &FileRecord, ctx: &EvalContext) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.evaluate(default_field, record, ctx),
            Self::All(items) => items.iter().all(|i| i.evaluate(default_field, record, ctx)),
            Self::Any(items) => items.iter().any(|i| i.evaluate(default_field, record, ctx)),
        }
    }
}

fn parse_clause(clause: &str) -> Result<CompareExpr, ParseError> {
    let leaves = clause
        .split(" or ")
        .map(|leaf| Comparison::parse(leaf).map(CompareExpr::Leaf))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collapse(leaves, CompareExpr::Any))
}

fn collapse(mut items: Vec<CompareExpr>, wrap: fn(Vec<CompareExpr>) -> CompareExpr) -> CompareExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
