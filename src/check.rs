//! Minimum memory consistency between templates and the OS database.
//!
//! Each template names the operating systems it supports through labels under
//! a common prefix. The lexicographically greatest such label is taken as the
//! newest OS, its authoritative minimum RAM is looked up and compared with the
//! memory the template requests. Every template is checked; problems are
//! collected in a [`Report`] instead of stopping at the first one.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::construct::Database;
use crate::error::{OsinfoError, Result};

pub const DEFAULT_LABEL_PREFIX: &str = "os.template.kubevirt.io";
pub const MIN_RAM_PATH: &str = "resources.architecture=x86_64|all,scope=minimum.ram";

const GIBIBYTE: f64 = (1u64 << 30) as f64;

lazy_static! {
    static ref GIBIBYTES: Regex = Regex::new(r"^\s*([0-9]+(?:\.[0-9]*)?|\.[0-9]+)Gi\s*$").unwrap();
}

/// What the checker needs to know about a deployment template.
pub trait Template {
    fn name(&self) -> &str;
    fn labels(&self) -> &BTreeMap<String, String>;
    fn declared_min_memory(&self) -> Option<&str>;
}

pub fn os_labels<'t>(labels: &'t BTreeMap<String, String>, prefix: &str) -> Vec<&'t str> {
    labels
        .keys()
        .filter(|label| label.starts_with(prefix))
        .map(String::as_str)
        .collect()
}

/// Plain string ordering, so `fedora9` outranks `fedora40`.
pub fn newest_os_label<'t>(labels: &[&'t str]) -> Option<&'t str> {
    labels.iter().copied().max()
}

pub fn short_id_from_label(label: &str) -> &str {
    label.rsplit('/').next().unwrap_or(label)
}

/// `"1.5Gi"` to bytes, truncating any fraction of a byte.
pub fn parse_gibibytes(text: &str) -> Option<i64> {
    let captures = GIBIBYTES.captures(text)?;
    let magnitude: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some((magnitude * GIBIBYTE) as i64)
}

// ------------- Report -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    os_label: String,
    template: String,
}

impl Violation {
    pub fn new(os_label: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            os_label: os_label.into(),
            template: template.into(),
        }
    }
    pub fn os_label(&self) -> &str {
        &self.os_label
    }
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Memory requirements for OS: {} are not compatible with the requirements set in: {}",
            self.os_label, self.template
        )
    }
}

/// A template that could not be checked at all.
#[derive(Debug)]
pub struct Failure {
    pub template: String,
    pub error: OsinfoError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Checking {} failed: {}", self.template, self.error)
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub violations: Vec<Violation>,
    pub failures: Vec<Failure>,
    pub skipped: Vec<String>,
    pub checked: usize,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.violations.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut lines: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        lines.extend(self.failures.iter().map(|e| e.to_string()));
        write!(f, "{}", lines.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Passed,
    Violated(Violation),
}

// ------------- Checker -------------
pub struct MemoryChecker<'db> {
    database: &'db Database,
    label_prefix: String,
}

impl<'db> MemoryChecker<'db> {
    pub fn new(database: &'db Database) -> Self {
        Self::with_label_prefix(database, DEFAULT_LABEL_PREFIX)
    }
    pub fn with_label_prefix(database: &'db Database, label_prefix: impl Into<String>) -> Self {
        Self {
            database,
            label_prefix: label_prefix.into(),
        }
    }
    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }
    /// Authoritative minimum RAM in bytes for an OS.
    pub fn min_ram(&self, short_id: &str) -> Result<i64> {
        let os = self.database.lookup_by_short_id(short_id);
        let node = os.get(MIN_RAM_PATH)?;
        node.as_i64()
            .ok_or_else(|| OsinfoError::not_found(format!("[{}].{} as an integer byte count", short_id, MIN_RAM_PATH)))
    }
    pub fn check_template<T: Template + ?Sized>(&self, template: &T) -> Result<Outcome> {
        let labels = os_labels(template.labels(), &self.label_prefix);
        let Some(newest) = newest_os_label(&labels) else {
            info!(template = template.name(), "no OS labels, skipping");
            return Ok(Outcome::Skipped);
        };
        let required = self.min_ram(short_id_from_label(newest))?;
        let declared = template.declared_min_memory().ok_or_else(|| OsinfoError::Template {
            template: template.name().to_owned(),
            message: "no memory request declared".to_owned(),
        })?;
        let declared = parse_gibibytes(declared).ok_or_else(|| OsinfoError::Template {
            template: template.name().to_owned(),
            message: format!("memory request {:?} is not a Gi quantity", declared),
        })?;
        if declared < required {
            Ok(Outcome::Violated(Violation::new(newest, template.name())))
        } else {
            Ok(Outcome::Passed)
        }
    }
    pub fn check<T: Template>(&self, templates: &[T]) -> Report {
        let mut report = Report::default();
        for template in templates {
            info!(template = template.name(), "checking memory requirements consistency");
            match self.check_template(template) {
                Ok(Outcome::Skipped) => report.skipped.push(template.name().to_owned()),
                Ok(Outcome::Passed) => report.checked += 1,
                Ok(Outcome::Violated(violation)) => {
                    report.checked += 1;
                    report.violations.push(violation);
                }
                Err(error) => {
                    warn!(template = template.name(), %error, "minimum memory requirements validation failed");
                    report.failures.push(Failure {
                        template: template.name().to_owned(),
                        error,
                    });
                }
            }
        }
        report
    }
}
