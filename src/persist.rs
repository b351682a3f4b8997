// used to detect calendar dates in untyped sources
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::datatype::{DATE_FORMAT, Record, Scalar, Value};
use crate::error::{OsinfoError, Result};

pub const SHORT_ID_FIELD: &str = "short_id";

lazy_static! {
    static ref DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Anything that can hand over raw OS records from some location.
pub trait RecordSource {
    fn location(&self) -> String;
    fn read_records(&self) -> Result<Vec<Record>>;
}

// ------------- JSON -------------
// Turns parsed JSON into the value model. Strings that are exact calendar
// dates become dates, integral numbers become integers.
pub fn convert(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Scalar(Scalar::Null),
        serde_json::Value::Bool(b) => Value::Scalar(Scalar::Boolean(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Scalar(Scalar::Integer(i)),
            None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        serde_json::Value::String(s) => {
            if DATE.is_match(s) {
                if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
                    return Value::Scalar(Scalar::Date(date));
                }
            }
            Value::Scalar(Scalar::String(s.clone()))
        }
        serde_json::Value::Array(items) => Value::List(items.iter().map(convert).collect()),
        serde_json::Value::Object(map) => Value::Record(map.iter().map(|(k, v)| (k.as_str(), convert(v))).collect()),
    }
}

/// Reads a JSON file, or every `*.json` file below a directory in sorted
/// path order. A file holds one OS record or an array of them.
#[derive(Debug, Clone)]
pub struct JsonSource {
    location: PathBuf,
}

impl JsonSource {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }
    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.location.is_file() {
            return Ok(vec![self.location.clone()]);
        }
        if !self.location.is_dir() {
            return Err(OsinfoError::unreadable(self.location(), "no such file or directory"));
        }
        let mut files = Vec::new();
        collect_json_files(&self.location, &mut files)?;
        files.sort();
        Ok(files)
    }
    fn read_file(&self, file: &Path) -> Result<Vec<Record>> {
        let location = file.display().to_string();
        let text = fs::read_to_string(file).map_err(|e| OsinfoError::unreadable(&location, e))?;
        let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| OsinfoError::unreadable(&location, e))?;
        let values = match convert(&json) {
            Value::List(items) => items,
            other => vec![other],
        };
        let mut records = Vec::with_capacity(values.len());
        for (n, value) in values.into_iter().enumerate() {
            let kind = value.kind();
            let Value::Record(record) = value else {
                return Err(OsinfoError::unreadable(&location, format!("entry {} is a {}, not a record", n, kind)));
            };
            if record.scalar(SHORT_ID_FIELD).and_then(Scalar::as_str).is_none() {
                return Err(OsinfoError::unreadable(&location, format!("entry {} has no string {}", n, SHORT_ID_FIELD)));
            }
            records.push(record);
        }
        debug!(file = %location, records = records.len(), "read record file");
        Ok(records)
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| OsinfoError::unreadable(dir.display().to_string(), e))?;
    for entry in entries {
        let path = entry.map_err(|e| OsinfoError::unreadable(dir.display().to_string(), e))?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

impl RecordSource for JsonSource {
    fn location(&self) -> String {
        self.location.display().to_string()
    }
    fn read_records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for file in self.files()? {
            records.extend(self.read_file(&file)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversion_types_scalars() {
        let value = convert(&json!({
            "short_id": "fedora20",
            "release_date": "2013-12-17",
            "vendor": "2013-12-17 and later",
            "ram": 1073741824u64,
            "ratio": 1.5,
            "eol_date": null,
            "devices": [{"name": "virtio-net"}]
        }));
        let record = value.as_record().expect("record");
        assert_eq!(record.scalar("release_date"), Some(&Scalar::Date(NaiveDate::from_ymd_opt(2013, 12, 17).unwrap())));
        assert!(matches!(record.scalar("vendor"), Some(Scalar::String(_))));
        assert_eq!(record.scalar("ram"), Some(&Scalar::Integer(1073741824)));
        assert_eq!(record.scalar("ratio"), Some(&Scalar::Float(1.5)));
        assert_eq!(record.scalar("eol_date"), Some(&Scalar::Null));
        assert_eq!(record.field("devices").and_then(Value::as_list).map(|l| l.len()), Some(1));
    }

    #[test]
    fn invalid_dates_stay_strings() {
        let value = convert(&json!("2023-02-30"));
        assert_eq!(value, Value::Scalar(Scalar::String("2023-02-30".into())));
    }
}
