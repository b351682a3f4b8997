
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OsinfoError {
    #[error("Not found: {path}")]
    NotFound { path: String },
    #[error("Index out of range: {path} (index {index}, length {len})")]
    IndexOutOfRange { path: String, index: usize, len: usize },
    #[error("Malformed path: {path}: {message}")]
    MalformedPath { path: String, message: String },
    #[error("Source unreadable: {location}: {message}")]
    SourceUnreadable { location: String, message: String },
    #[error("Template error in {template}: {message}")]
    Template { template: String, message: String },
    #[error("Config error: {0}")]
    Config(String),
}

impl OsinfoError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
    pub fn unreadable(location: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceUnreadable { location: location.into(), message: message.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, OsinfoError>;

// Helper conversions
impl From<config::ConfigError> for OsinfoError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
