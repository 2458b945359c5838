//! Defect matchers for include/exclude filtering
//!
//! A `Matcher` is the capability the filtering stage wraps: given a defect,
//! decide whether it is covered. User-facing filter expressions are plain
//! pattern-id strings, or regular expressions when prefixed with `~`.

use crate::defect::Defect;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter expression '{expr}': {source}")]
    InvalidExpression {
        expr: String,
        #[source]
        source: regex::Error,
    },
}

/// Capability consulted by the filtering stage.
///
/// Takes `&mut self` because some matchers (suppressions) record which of
/// their rules fired.
pub trait Matcher {
    fn matches(&mut self, defect: &Defect) -> bool;
}

/// A single pattern expression: exact match, or regex when written `~expr`.
#[derive(Debug, Clone)]
pub enum PatternExpr {
    /// Matches every pattern id. Written as an empty expression.
    Any,
    Exact(String),
    Regex(Regex),
}

impl PatternExpr {
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        if expr.is_empty() {
            return Ok(PatternExpr::Any);
        }
        if let Some(raw) = expr.strip_prefix('~') {
            let re = Regex::new(raw).map_err(|source| FilterError::InvalidExpression {
                expr: expr.to_string(),
                source,
            })?;
            return Ok(PatternExpr::Regex(re));
        }
        Ok(PatternExpr::Exact(expr.to_string()))
    }

    pub fn matches(&self, pattern_id: &str) -> bool {
        match self {
            PatternExpr::Any => true,
            PatternExpr::Exact(s) => s == pattern_id,
            PatternExpr::Regex(re) => re.is_match(pattern_id),
        }
    }

    /// The expression text for messages; `None` for the match-all form.
    pub fn describe(&self) -> Option<&str> {
        match self {
            PatternExpr::Any => None,
            PatternExpr::Exact(s) => Some(s),
            PatternExpr::Regex(re) => Some(re.as_str()),
        }
    }
}

/// Matches a defect when any of the expressions covers its pattern id.
#[derive(Debug, Default)]
pub struct PatternSetMatcher {
    exprs: Vec<PatternExpr>,
}

impl PatternSetMatcher {
    pub fn new(exprs: Vec<PatternExpr>) -> Self {
        Self { exprs }
    }

    pub fn parse_all(exprs: &[String]) -> Result<Self, FilterError> {
        let exprs = exprs
            .iter()
            .map(|e| PatternExpr::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exprs })
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl Matcher for PatternSetMatcher {
    fn matches(&mut self, defect: &Defect) -> bool {
        self.exprs.iter().any(|e| e.matches(&defect.pattern))
    }
}
