//! Error types for validator-sweep
//!
//! Every message names the offending value so a failed sweep can be traced
//! back to the slice, group, or file that caused it.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Validator-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an argument outside the accepted domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The no-filtering sentinel did not return the full slice (critical bug)
    #[error("No-filter sentinel returned {actual} rows, expected {expected}\nThe threshold filter or baseline lookup is inconsistent. Please report this issue.")]
    SentinelMismatch {
        /// Rows in the unfiltered slice
        expected: usize,
        /// Rows returned by the sentinel filter
        actual: usize,
    },

    /// Baseline oracle has no accuracy for the requested task
    #[error("No baseline accuracy for task {task} ({domain} {split})")]
    UnknownTask {
        /// Task display name
        task: String,
        /// Domain side of the lookup (`src` or `target`)
        domain: String,
        /// Split of the lookup (`train` or `val`)
        split: String,
    },

    /// Two rows share the same identity tuple
    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),

    /// The same checkpoint carries different target accuracies across validators
    #[error("Inconsistent target accuracy for checkpoint {checkpoint}: {first} != {second}")]
    InconsistentAccuracy {
        /// Checkpoint identity
        checkpoint: String,
        /// First observed accuracy
        first: f64,
        /// Conflicting accuracy
        second: f64,
    },

    /// Record batch does not follow the record schema
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Storage error (Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
