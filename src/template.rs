// Template documents are read with the same path machinery used for the OS
// database, so the nesting of a template is described by path constants.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::check::Template;
use crate::datatype::Value;
use crate::error::{OsinfoError, Result};
use crate::path::{self, Node};
use crate::persist::convert;

pub const NAME_PATH: &str = "metadata.name";
pub const LABELS_PATH: &str = "metadata.labels";
pub const MEMORY_PATH: &str = "objects.0.spec.template.spec.domain.resources.requests.memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    file_name: String,
    name: String,
    labels: BTreeMap<String, String>,
    memory: Option<String>,
}

impl TemplateDocument {
    pub fn from_value(file_name: &str, document: &Value) -> Result<Self> {
        if document.as_record().is_none() {
            return Err(OsinfoError::Template {
                template: file_name.to_owned(),
                message: format!("expected an object, found {}", document.kind()),
            });
        }
        let name = match path::resolve(document, NAME_PATH) {
            Ok(node) => node.to_string(),
            Err(_) => file_name.to_owned(),
        };
        let mut labels = BTreeMap::new();
        if let Ok(Node::Record(record)) = path::resolve(document, LABELS_PATH) {
            for (key, value) in record.record().iter() {
                labels.insert(key.clone(), value.to_string());
            }
        }
        let memory = match path::resolve(document, MEMORY_PATH) {
            Ok(Node::Scalar(scalar)) => Some(scalar.to_string()),
            _ => None,
        };
        Ok(Self {
            file_name: file_name.to_owned(),
            name,
            labels,
            memory,
        })
    }
    /// `None` for a file that holds no document at all.
    pub fn from_json_str(file_name: &str, text: &str) -> Result<Option<Self>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let json: serde_json::Value = serde_json::from_str(text).map_err(|e| OsinfoError::Template {
            template: file_name.to_owned(),
            message: e.to_string(),
        })?;
        if json.is_null() {
            return Ok(None);
        }
        Self::from_value(file_name, &convert(&json)).map(Some)
    }
    pub fn load(file: &Path) -> Result<Option<Self>> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        let text = fs::read_to_string(file).map_err(|e| OsinfoError::Template {
            template: file_name.clone(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&file_name, &text)
    }
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Template for TemplateDocument {
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
    fn declared_min_memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }
}

/// Every `*.json` file directly inside `dir`, in file name order.
pub fn load_templates(dir: &Path) -> Result<Vec<TemplateDocument>> {
    let unreadable = |e: std::io::Error| OsinfoError::Template {
        template: dir.display().to_string(),
        message: e.to_string(),
    };
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    let mut templates = Vec::with_capacity(files.len());
    for file in files {
        match TemplateDocument::load(&file)? {
            Some(template) => templates.push(template),
            None => info!(file = %file.display(), "empty template file"),
        }
    }
    Ok(templates)
}
