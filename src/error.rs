// src/error.rs

//! Crate-wide error type

use crate::reconcile::Conflict;
use thiserror::Error;

/// Errors produced while reconciling a resolution against a lock
#[derive(Error, Debug)]
pub enum Error {
    /// A version-specifier string could not be parsed
    #[error("Malformed specifier '{spec}': {reason}")]
    MalformedSpecifier { spec: String, reason: String },

    /// A version string is not a valid PEP 440 version
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// A proposed version cannot be reconciled with the constraints on it
    #[error(transparent)]
    DependencyConflict(#[from] Conflict),

    /// An entry was built with neither a resolved nor a locked dict
    #[error("Entry '{0}' has neither a resolved nor a locked source")]
    MissingSource(String),

    /// The external resolver failed
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Environment introspection failed
    #[error("Environment error: {0}")]
    Environment(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// The structured conflict, when this is a dependency conflict
    pub fn as_conflict(&self) -> Option<&Conflict> {
        match self {
            Error::DependencyConflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}

/// Result type used throughout relock
pub type Result<T> = std::result::Result<T, Error>;
