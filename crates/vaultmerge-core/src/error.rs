//! Error types for the export file boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a vault export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export file could not be read
    #[error("failed to read export {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export file is not valid vault JSON
    #[error("failed to parse export {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The vault could not be serialized
    #[error("failed to serialize vault: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The output file could not be written
    #[error("failed to write export {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
