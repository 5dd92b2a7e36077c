//! Error types for the normalizers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for normalizer operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Everything that can abort a normalization run.
///
/// None of these are retried: a run either completes and writes its output
/// in full, or fails with one of these and writes nothing.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input path is missing or cannot be opened for reading
    #[error("Could not find input file {}", path.display())]
    InputNotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input could not be parsed by the selected loader
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A pass expected a node that the document does not have
    #[error("Unexpected document structure: {0}")]
    StructuralAssumptionViolated(String),

    /// Output could not be written
    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NormalizeError {
    pub(crate) fn structure(message: impl Into<String>) -> Self {
        NormalizeError::StructuralAssumptionViolated(message.into())
    }
}
