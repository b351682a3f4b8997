//! Layered settings: built-in defaults, an optional settings file and
//! `OSINFO_` prefixed environment variables, in increasing precedence.
//!
//! ```toml
//! sources = ["data/osinfo", "data/osinfo-override"]
//! templates = "dist/templates"
//! label_prefix = "os.template.kubevirt.io"
//! grace_days = 180
//! log_filter = "info"
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::check::DEFAULT_LABEL_PREFIX;
use crate::error::{OsinfoError, Result};
use crate::lifecycle::DEFAULT_GRACE_DAYS;

pub const DEFAULT_SETTINGS_FILE: &str = "osinfo-lookup.toml";
pub const ENV_PREFIX: &str = "OSINFO";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Record sources, later ones overriding earlier ones.
    pub sources: Vec<PathBuf>,
    pub templates: PathBuf,
    pub label_prefix: String,
    pub grace_days: i64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("data/osinfo"), PathBuf::from("data/osinfo-override")],
            templates: PathBuf::from("dist/templates"),
            label_prefix: DEFAULT_LABEL_PREFIX.to_owned(),
            grace_days: DEFAULT_GRACE_DAYS,
            log_filter: "info".to_owned(),
        }
    }
}

impl Settings {
    /// Reads `file` when given (it must then exist), otherwise the default
    /// settings file if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let sources: Vec<String> = defaults.sources.iter().map(|p| p.display().to_string()).collect();
        let mut builder = Config::builder()
            .set_default("sources", sources)?
            .set_default("templates", defaults.templates.display().to_string())?
            .set_default("label_prefix", defaults.label_prefix)?
            .set_default("grace_days", defaults.grace_days)?
            .set_default("log_filter", defaults.log_filter)?;
        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_SETTINGS_FILE).required(false)),
        };
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sources"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(OsinfoError::Config("at least one record source is required".to_owned()));
        }
        if self.grace_days < 0 {
            return Err(OsinfoError::Config(format!("grace_days must not be negative, got {}", self.grace_days)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file");
        writeln!(file, "sources = [\"a\", \"b\", \"c\"]\ngrace_days = 30").expect("write");
        let settings = Settings::load(Some(file.path())).expect("loads");
        assert_eq!(settings.sources, [PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]);
        assert_eq!(settings.grace_days, 30);
        assert_eq!(settings.label_prefix, DEFAULT_LABEL_PREFIX);
    }

    #[test]
    fn validation_rejects_nonsense() {
        let settings = Settings {
            sources: Vec::new(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(OsinfoError::Config(_))));
        let settings = Settings {
            grace_days: -1,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(OsinfoError::Config(_))));
    }
}
