//! Error types for the knowledge base.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Category is not listed in categories.yaml
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A record on disk could not be deserialized
    #[error("Malformed record {}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Missing required fields on write, or an unreadable config file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Id, category or tag that is unsafe to use as a file name
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Could not generate a unique id after {0} attempts")]
    IdExhausted(u32),

    #[error("Lock error on {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KnowledgeError {
    fn from(e: serde_json::Error) -> Self {
        KnowledgeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KnowledgeError {
    fn from(e: serde_yaml::Error) -> Self {
        KnowledgeError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;
