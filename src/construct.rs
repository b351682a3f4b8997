// the short id index uses the same fast hasher as record fields
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

// our own stuff that we need
use crate::datatype::{FieldHasher, Record, Scalar};
use crate::error::{OsinfoError, Result};
use crate::filter::Filter;
use crate::lifecycle;
use crate::path::{Node, RecordNode};
use crate::persist::{JsonSource, RecordSource, SHORT_ID_FIELD};

pub fn short_id_of(record: &Record) -> Option<&str> {
    record.scalar(SHORT_ID_FIELD).and_then(Scalar::as_str)
}

// ------------- OsKeeper -------------
// Owns the OS records in first-insertion order. Keeping a record whose
// identity is already kept replaces the earlier record in place.
#[derive(Debug, Default)]
struct OsKeeper {
    kept: Vec<Record>,
    lookup: HashMap<String, usize, FieldHasher>,
}

impl OsKeeper {
    fn keep(&mut self, short_id: String, record: Record) -> bool {
        match self.lookup.entry(short_id) {
            Entry::Occupied(e) => {
                self.kept[*e.get()] = record;
                true
            }
            Entry::Vacant(e) => {
                e.insert(self.kept.len());
                self.kept.push(record);
                false
            }
        }
    }
    fn get(&self, short_id: &str) -> Option<&Record> {
        self.lookup.get(short_id).map(|n| &self.kept[*n])
    }
    fn len(&self) -> usize {
        self.kept.len()
    }
}

// ------------- Lookup results -------------
/// Stands in for an OS that is not in the database; carries only the id asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    short_id: String,
}

impl Placeholder {
    pub fn new(short_id: impl Into<String>) -> Self {
        Self {
            short_id: short_id.into(),
        }
    }
    pub fn short_id(&self) -> &str {
        &self.short_id
    }
}

#[derive(Debug, Clone)]
pub enum OsMatch<'db> {
    Found(RecordNode<'db>),
    Missing(Placeholder),
}

impl<'db> OsMatch<'db> {
    pub fn short_id(&self) -> &str {
        match self {
            OsMatch::Found(node) => short_id_of(node.record()).unwrap_or_default(),
            OsMatch::Missing(placeholder) => placeholder.short_id(),
        }
    }
    pub fn is_found(&self) -> bool {
        matches!(self, OsMatch::Found(_))
    }
    pub fn record(&self) -> Option<&'db Record> {
        match self {
            OsMatch::Found(node) => Some(node.record()),
            OsMatch::Missing(_) => None,
        }
    }
    pub fn get(&self, path: &str) -> Result<Node<'db>> {
        match self {
            OsMatch::Found(node) => node.get(path),
            OsMatch::Missing(placeholder) => Err(OsinfoError::not_found(format!("[{}].{}", placeholder.short_id, path))),
        }
    }
    pub fn has(&self, path: &str) -> bool {
        match self {
            OsMatch::Found(node) => node.has(path),
            OsMatch::Missing(_) => false,
        }
    }
    /// A placeholder has no release date, so it is never active.
    pub fn is_active(&self, as_of: NaiveDate, grace_days: i64) -> bool {
        self.record().is_some_and(|os| lifecycle::is_active(os, as_of, grace_days))
    }
}

// ------------- Database -------------
// Built once from ordered sources and read-only afterwards. Later sources
// override earlier ones record by record, never field by field.
#[derive(Debug)]
pub struct Database {
    keeper: OsKeeper,
    sources: Vec<String>,
}

impl Database {
    /// Opens JSON sources (files or directories) in the given order.
    pub fn open<P: AsRef<Path>>(sources: &[P]) -> Result<Self> {
        let sources: Vec<JsonSource> = sources.iter().map(|p| JsonSource::new(p.as_ref())).collect();
        let sources: Vec<&dyn RecordSource> = sources.iter().map(|s| s as &dyn RecordSource).collect();
        Self::from_sources(&sources)
    }
    /// All-or-nothing: the first unreadable source aborts construction.
    pub fn from_sources(sources: &[&dyn RecordSource]) -> Result<Self> {
        let mut database = Database {
            keeper: OsKeeper::default(),
            sources: Vec::with_capacity(sources.len()),
        };
        let mut overrides = 0;
        for source in sources {
            let location = source.location();
            let records = source.read_records()?;
            debug!(source = %location, records = records.len(), "loaded source");
            for record in records {
                if database.keep(record, &location)? {
                    overrides += 1;
                }
            }
            database.sources.push(location);
        }
        info!(sources = database.sources.len(), records = database.len(), overrides, "database built");
        Ok(database)
    }
    /// Builds a database straight from records, mostly useful for tests and
    /// embedding callers that already hold parsed data.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let mut database = Database {
            keeper: OsKeeper::default(),
            sources: Vec::new(),
        };
        for record in records {
            database.keep(record, "<memory>")?;
        }
        Ok(database)
    }
    fn keep(&mut self, record: Record, location: &str) -> Result<bool> {
        let short_id = short_id_of(&record)
            .ok_or_else(|| OsinfoError::unreadable(location, format!("record without a string {}", SHORT_ID_FIELD)))?
            .to_owned();
        let previously_kept = self.keeper.keep(short_id.clone(), record);
        if previously_kept {
            debug!(%short_id, source = %location, "record overridden");
        }
        Ok(previously_kept)
    }
    pub fn len(&self) -> usize {
        self.keeper.len()
    }
    pub fn is_empty(&self) -> bool {
        self.keeper.len() == 0
    }
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
    pub fn short_ids(&self) -> Vec<&str> {
        self.keeper.kept.iter().filter_map(short_id_of).collect()
    }
    pub fn records(&self) -> impl Iterator<Item = RecordNode<'_>> {
        self.keeper.kept.iter().map(node_for)
    }
    pub fn get(&self, short_id: &str) -> Option<RecordNode<'_>> {
        self.keeper.get(short_id).map(node_for)
    }
    /// Never fails: an unknown id gives a placeholder and a warning.
    pub fn lookup_by_short_id(&self, short_id: &str) -> OsMatch<'_> {
        match self.get(short_id) {
            Some(node) => OsMatch::Found(node),
            None => {
                warn!(%short_id, "OS not found");
                OsMatch::Missing(Placeholder::new(short_id))
            }
        }
    }
    /// All records whose `key` field equals `value`, in database order.
    pub fn lookup_by_property(&self, key: &str, value: &str) -> Vec<RecordNode<'_>> {
        let filter = Filter::single(key, value);
        self.keeper
            .kept
            .iter()
            .filter(|record| filter.matches(record))
            .map(node_for)
            .collect()
    }
    /// `term` is either a bare short id or a single `key=value` clause. When
    /// nothing matches the result holds one placeholder for `term`.
    pub fn lookup(&self, term: &str) -> Vec<OsMatch<'_>> {
        match term.split_once('=') {
            None => vec![self.lookup_by_short_id(term)],
            Some((key, value)) => {
                let found = self.lookup_by_property(key, value);
                if found.is_empty() {
                    warn!(%term, "OS not found");
                    vec![OsMatch::Missing(Placeholder::new(term))]
                } else {
                    found.into_iter().map(OsMatch::Found).collect()
                }
            }
        }
    }
}

fn node_for(record: &Record) -> RecordNode<'_> {
    RecordNode::new(record, format!("[{}]", short_id_of(record).unwrap_or_default()))
}
