use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HotfigError {
    #[error("required key '{key}' is missing or empty")]
    Required { key: String },

    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("cannot parse value for '{key}': {reason}")]
    Parse { key: String, reason: String },

    #[error("unsupported type for '{key}': {kind}")]
    UnsupportedType { key: String, kind: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    FileFormat { path: PathBuf, reason: String },

    #[error("watch interval must be greater than zero")]
    InvalidPollInterval,
}

impl HotfigError {
    /// The canonical key the error is attributed to, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Required { key }
            | Self::Parse { key, .. }
            | Self::UnsupportedType { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }
}
