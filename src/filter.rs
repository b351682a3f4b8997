//! Equality filters of the form `key1=v1a|v1b,key2=v2`.
//!
//! The outer comma joins terms with AND, the pipe joins alternatives with OR
//! and every atom is a string equality against the candidate's field. A
//! candidate lacking a field simply does not match; scanning a list never
//! aborts because one element has a different shape.

use pest::Parser;
use pest::iterators::Pair;
use std::fmt;
use tracing::debug;

use crate::datatype::{Record, Value};
use crate::error::{OsinfoError, Result};
use crate::path::{PathParser, Rule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    key: String,
    alternatives: Vec<String>,
}

impl Term {
    pub fn new(key: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            key: key.into(),
            alternatives,
        }
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
    fn matches(&self, candidate: &Record) -> bool {
        match candidate.field(&self.key) {
            Some(Value::Scalar(scalar)) => self.alternatives.iter().any(|alt| scalar.matches(alt)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<Term>,
}

impl Filter {
    pub fn parse(clause: &str) -> Result<Self> {
        let mut pairs = PathParser::parse(Rule::clauses, clause).map_err(|e| OsinfoError::MalformedPath {
            path: clause.to_owned(),
            message: e.variant.message().into_owned(),
        })?;
        let filter = pairs
            .next()
            .and_then(|clauses| clauses.into_inner().find(|p| p.as_rule() == Rule::filter))
            .ok_or_else(|| OsinfoError::MalformedPath {
                path: clause.to_owned(),
                message: "expected at least one key=value clause".to_owned(),
            })?;
        Ok(Self::from_pair(filter))
    }
    /// A one-term filter with a literal value; pipes in `value` are not split.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            terms: vec![Term::new(key, vec![value.into()])],
        }
    }
    pub(crate) fn from_pair(pair: Pair<'_, Rule>) -> Self {
        let terms = pair
            .into_inner()
            .filter(|clause| clause.as_rule() == Rule::clause)
            .map(|clause| {
                let mut parts = clause.into_inner();
                let key = parts.next().map(|k| k.as_str().to_owned()).unwrap_or_default();
                let alternatives = parts.map(|alt| alt.as_str().to_owned()).collect();
                Term::new(key, alternatives)
            })
            .collect();
        Self { terms }
    }
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
    pub fn matches(&self, candidate: &Record) -> bool {
        self.terms.iter().all(|term| term.matches(candidate))
    }
    /// List elements that are not records never match.
    pub fn matches_value(&self, candidate: &Value) -> bool {
        candidate.as_record().is_some_and(|record| self.matches(record))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{}={}", t.key, t.alternatives.join("|")))
            .collect();
        write!(f, "{}", terms.join(","))
    }
}

/// Parse `clause` and test it against `candidate`. A clause that does not
/// parse matches nothing.
pub fn matches(clause: &str, candidate: &Record) -> bool {
    match Filter::parse(clause) {
        Ok(filter) => filter.matches(candidate),
        Err(e) => {
            debug!(error = %e, "unparseable filter treated as non-match");
            false
        }
    }
}
