//! Engine-wide error types.

use thiserror::Error;

/// Engine-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine-wide error type.
///
/// Every variant aborts the resolve call that produced it; the engine never
/// returns a partially rewritten pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity_type} not found: {}", ids.join(", "))]
    NotFound {
        entity_type: &'static str,
        ids: Vec<String>,
    },

    #[error("Malformed op #{index} ({op_type}) in module '{module}': {reason}")]
    MalformedOp {
        module: String,
        index: usize,
        op_type: String,
        reason: String,
    },

    #[error("Dependency cycle detected: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    #[error("Pipeline '{pipeline}' is {mode}, cannot {operation}")]
    InvalidPipelineMode {
        pipeline: String,
        mode: String,
        operation: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(entity_type: &'static str, ids: impl IntoIterator<Item = String>) -> Self {
        Self::NotFound {
            entity_type,
            ids: ids.into_iter().collect(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when the error names identifiers that could not be resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
