//! Path expressions and the read-only views they walk.
//!
//! A path is a dot-separated list of segments, each being a field name, a
//! zero-based list index or a filter clause (anything containing `=`):
//!
//! ```text
//! resources.architecture=x86_64|all,scope=minimum.ram
//! devices.2.name
//! ```
//!
//! Segments are applied strictly left to right and the first one that fails
//! aborts the resolution. Every composite reached on the way is wrapped in a
//! [`RecordNode`] or [`ListNode`] that borrows the underlying data and carries
//! the accumulated path for diagnostics; scalars come back as they are.
//!
//! [`Node::has`] answers whether [`Node::get`] would succeed without ever
//! failing itself.

use chrono::NaiveDate;
use pest::Parser;
use pest_derive::Parser;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::datatype::{Record, Scalar, Value};
use crate::error::{OsinfoError, Result};
use crate::filter::Filter;

#[derive(Parser)]
#[grammar = "path.pest"]
pub(crate) struct PathParser;

// ------------- Segments -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Filter(Filter),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{}", name),
            Segment::Index(n) => write!(f, "{}", n),
            Segment::Filter(filter) => write!(f, "{}", filter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    text: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn parse(text: &str) -> Result<Self> {
        let malformed = |message: String| OsinfoError::MalformedPath {
            path: text.to_owned(),
            message,
        };
        let mut pairs = PathParser::parse(Rule::path, text)
            .map_err(|e| malformed(e.variant.message().into_owned()))?;
        let path = pairs.next().ok_or_else(|| malformed("empty path".to_owned()))?;
        let mut segments = Vec::new();
        for pair in path.into_inner() {
            match pair.as_rule() {
                Rule::field => segments.push(Segment::Field(pair.as_str().to_owned())),
                // digits too long for usize can never be in range
                Rule::index => segments.push(Segment::Index(pair.as_str().parse().unwrap_or(usize::MAX))),
                Rule::filter => segments.push(Segment::Filter(Filter::from_pair(pair))),
                _ => (),
            }
        }
        Ok(Self {
            text: text.to_owned(),
            segments,
        })
    }
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for PathExpr {
    type Err = OsinfoError;
    fn from_str(s: &str) -> Result<Self> {
        PathExpr::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn join(base: &str, segment: &Segment) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", base, segment)
    }
}

// ------------- RecordNode -------------
#[derive(Debug, Clone)]
pub struct RecordNode<'db> {
    record: &'db Record,
    path: String,
}

impl<'db> RecordNode<'db> {
    pub fn new(record: &'db Record, path: impl Into<String>) -> Self {
        Self {
            record,
            path: path.into(),
        }
    }
    pub fn record(&self) -> &'db Record {
        self.record
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn contains(&self, name: &str) -> bool {
        self.record.contains(name)
    }
    pub fn get_field(&self, name: &str) -> Result<Node<'db>> {
        let path = join(&self.path, &Segment::Field(name.to_owned()));
        match self.record.field(name) {
            Some(value) => Ok(Node::new(value, path)),
            None => Err(OsinfoError::not_found(path)),
        }
    }
    pub fn get(&self, path: &str) -> Result<Node<'db>> {
        Node::Record(self.clone()).get(path)
    }
    pub fn has(&self, path: &str) -> bool {
        Node::Record(self.clone()).has(path)
    }
}

// ------------- ListNode -------------
#[derive(Debug, Clone)]
pub struct ListNode<'db> {
    items: &'db [Value],
    path: String,
}

impl<'db> ListNode<'db> {
    pub fn new(items: &'db [Value], path: impl Into<String>) -> Self {
        Self {
            items,
            path: path.into(),
        }
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn get_index(&self, n: usize) -> Result<Node<'db>> {
        let path = join(&self.path, &Segment::Index(n));
        match self.items.get(n) {
            Some(value) => Ok(Node::new(value, path)),
            None => Err(OsinfoError::IndexOutOfRange {
                path,
                index: n,
                len: self.items.len(),
            }),
        }
    }
    /// Every element satisfying `filter`, in list order.
    pub fn search(&self, filter: &Filter) -> Vec<Node<'db>> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| filter.matches_value(item))
            .map(|(n, item)| Node::new(item, join(&self.path, &Segment::Index(n))))
            .collect()
    }
    /// The first element satisfying `filter`.
    pub fn find(&self, filter: &Filter) -> Result<Node<'db>> {
        match self.items.iter().position(|item| filter.matches_value(item)) {
            Some(n) => Ok(Node::new(&self.items[n], join(&self.path, &Segment::Filter(filter.clone())))),
            None => Err(OsinfoError::not_found(join(&self.path, &Segment::Filter(filter.clone())))),
        }
    }
    pub fn any_match(&self, filter: &Filter) -> bool {
        self.items.iter().any(|item| filter.matches_value(item))
    }
    pub fn iter(&self) -> impl Iterator<Item = Node<'db>> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(n, item)| Node::new(item, join(&self.path, &Segment::Index(n))))
    }
}

// ------------- Node -------------
#[derive(Debug, Clone)]
pub enum Node<'db> {
    Scalar(&'db Scalar),
    Record(RecordNode<'db>),
    List(ListNode<'db>),
}

impl<'db> Node<'db> {
    /// Scalars pass through, composites get wrapped for further chaining.
    pub fn new(value: &'db Value, path: impl Into<String>) -> Self {
        match value {
            Value::Scalar(s) => Node::Scalar(s),
            Value::Record(r) => Node::Record(RecordNode::new(r, path)),
            Value::List(l) => Node::List(ListNode::new(l, path)),
        }
    }
    pub fn path(&self) -> Option<&str> {
        match self {
            Node::Scalar(_) => None,
            Node::Record(r) => Some(r.path()),
            Node::List(l) => Some(l.path()),
        }
    }
    pub fn get(&self, path: &str) -> Result<Node<'db>> {
        let expr = PathExpr::parse(path)?;
        self.resolve(&expr)
    }
    pub fn resolve(&self, expr: &PathExpr) -> Result<Node<'db>> {
        let mut current = self.clone();
        let mut trail = self.path().unwrap_or_default().to_owned();
        for segment in expr.segments() {
            current = current.step(segment, &trail).inspect_err(|e| {
                debug!(path = %expr, error = %e, "path resolution failed");
            })?;
            trail = join(&trail, segment);
        }
        Ok(current)
    }
    pub fn has(&self, path: &str) -> bool {
        let Ok(expr) = PathExpr::parse(path) else {
            return false;
        };
        let Some((last, prefix)) = expr.segments().split_last() else {
            return false;
        };
        let mut current = self.clone();
        let mut trail = self.path().unwrap_or_default().to_owned();
        for segment in prefix {
            match current.step(segment, &trail) {
                Ok(next) => current = next,
                Err(_) => return false,
            }
            trail = join(&trail, segment);
        }
        current.contains(last)
    }
    // `trail` is only used for scalars, which do not carry their own path
    fn step(&self, segment: &Segment, trail: &str) -> Result<Node<'db>> {
        match (self, segment) {
            (Node::Record(r), Segment::Field(name)) => r.get_field(name),
            (Node::Record(r), Segment::Index(n)) => r.get_field(&n.to_string()),
            (Node::List(l), Segment::Index(n)) => l.get_index(*n),
            (Node::List(l), Segment::Filter(filter)) => l.find(filter),
            (node, segment) => Err(OsinfoError::not_found(join(node.path().unwrap_or(trail), segment))),
        }
    }
    fn contains(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (Node::Record(r), Segment::Field(name)) => r.contains(name),
            (Node::Record(r), Segment::Index(n)) => r.contains(&n.to_string()),
            (Node::List(l), Segment::Index(n)) => *n < l.len(),
            (Node::List(l), Segment::Filter(filter)) => l.any_match(filter),
            _ => false,
        }
    }
    pub fn as_scalar(&self) -> Option<&'db Scalar> {
        match self {
            Node::Scalar(s) => Some(*s),
            _ => None,
        }
    }
    pub fn as_record(&self) -> Option<&RecordNode<'db>> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&ListNode<'db>> {
        match self {
            Node::List(l) => Some(l),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&'db str> {
        self.as_scalar().and_then(Scalar::as_str)
    }
    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_i64)
    }
    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_scalar().and_then(Scalar::as_date)
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Scalar(s) => write!(f, "{}", s),
            Node::Record(r) => write!(f, "<Record @ {} {}>", r.path, r.record),
            Node::List(l) => write!(f, "<List @ {} len={}>", l.path, l.len()),
        }
    }
}

/// Walk `path` from `root`.
pub fn resolve<'db>(root: &'db Value, path: &str) -> Result<Node<'db>> {
    Node::new(root, "").get(path)
}

/// Whether [`resolve`] would succeed; never fails.
pub fn has(root: &Value, path: &str) -> bool {
    Node::new(root, "").has(path)
}
