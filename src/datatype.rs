// used for release and EOL dates
use chrono::NaiveDate;

// record fields are kept in a hash map with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;
use std::collections::hash_map::Iter;

// used to print out readable forms of a value
use std::fmt;

pub type FieldHasher = BuildHasherDefault<SeaHasher>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ------------- Scalar -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Null,
}

impl Scalar {
    pub fn data_type(&self) -> &'static str {
        match self {
            Scalar::String(_) => "String",
            Scalar::Integer(_) => "Integer",
            Scalar::Float(_) => "Float",
            Scalar::Boolean(_) => "Boolean",
            Scalar::Date(_) => "Date",
            Scalar::Null => "Null",
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    /// Dates are either stored as such or kept as `YYYY-MM-DD` strings by
    /// sources that do not type them.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(d) => Some(*d),
            Scalar::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
            _ => None,
        }
    }
    /// String equality against the canonical text form. Null equals nothing.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::String(s) => s == text,
            other => other.to_string() == text,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Scalar::Null => write!(f, "null"),
        }
    }
}

// ------------- Record -------------
// The schema is implicit and varies per record kind (OS, resources, device, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Value, FieldHasher>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: HashMap::default(),
        }
    }
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
    /// Convenience for scalar fields; composite fields yield `None`.
    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        self.field(name).and_then(Value::as_scalar)
    }
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.len());
        for name in self.names() {
            if let Some(value) = self.field(name) {
                parts.push(format!("{}: {}", name, value));
            }
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ------------- Value -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.data_type(),
            Value::Record(_) => "Record",
            Value::List(_) => "List",
        }
    }
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Record(r) => write!(f, "{}", r),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}
impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}
impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}
impl From<Vec<Record>> for Value {
    fn from(l: Vec<Record>) -> Self {
        Value::List(l.into_iter().map(Value::Record).collect())
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_owned()))
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Scalar::Float(x))
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Boolean(b))
    }
}
impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Scalar(Scalar::Date(d))
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Value::Scalar(Scalar::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_matching_uses_text_form() {
        assert!(Scalar::Integer(512).matches("512"));
        assert!(Scalar::Boolean(true).matches("true"));
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(Scalar::Date(date).matches("2024-02-01"));
        assert!(!Scalar::Null.matches("null"));
        assert!(!Scalar::String("x86_64".into()).matches("x86"));
    }

    #[test]
    fn string_dates_are_readable_as_dates() {
        let scalar = Scalar::String("2020-01-01".into());
        assert_eq!(scalar.as_date(), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(Scalar::String("soon".into()).as_date(), None);
    }

    #[test]
    fn record_display_is_sorted() {
        let record = Record::new().with("ram", 1024i64).with("arch", "all");
        assert_eq!(record.to_string(), "{arch: all, ram: 1024}");
    }
}
