//! Error types for model resolution

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Fatal conditions that stop the build of a single model.
///
/// Expected oddities in the input (unknown formats, `anyOf`, contradictory
/// nullability) are reported as diagnostics instead and never show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Schema '{schema}' references '{reference}', which is not defined in the document")]
    UnresolvedReference { schema: String, reference: String },

    #[error("Schema '{schema}' was requested again before it could be cached: {}", chain.join(" -> "))]
    CyclicReference { schema: String, chain: Vec<String> },

    #[error("Schema '{schema}' is part of a cyclic allOf chain: {}", cycle.join(" -> "))]
    CyclicInheritance { schema: String, cycle: Vec<String> },

    #[error("Schema '{schema}' depends on '{dependency}', which failed to resolve")]
    DependencyFailed { schema: String, dependency: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModelError {
    /// Name of the schema whose build failed, if the error is tied to one
    pub fn schema(&self) -> Option<&str> {
        match self {
            Self::UnresolvedReference { schema, .. }
            | Self::CyclicReference { schema, .. }
            | Self::CyclicInheritance { schema, .. }
            | Self::DependencyFailed { schema, .. } => Some(schema),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<config_crate::ConfigError> for ModelError {
    fn from(e: config_crate::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
