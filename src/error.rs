//! Error types for NOARK5 to RDF conversion

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Malformed document: {0}")]
    Structural(String),

    #[error("XML error at byte {position}: {reason}")]
    Xml { position: u64, reason: String },

    #[error("Unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Transform failed for element '{element}': {reason}")]
    Transform { element: String, reason: String },

    #[error("Failed to write '{}' for resource '{resource}': {source}", path.display())]
    Write {
        path: PathBuf,
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load config from {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("Invalid transform template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl ConvertError {
    pub(crate) fn transform(element: &str, reason: impl Into<String>) -> Self {
        ConvertError::Transform {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}
