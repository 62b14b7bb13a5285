use thiserror::Error;

use crate::model::SourceKind;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Fatal failures that abort a merge run. Per-row problems are reported as
/// [`ValidationWarning`](crate::model::ValidationWarning) values instead.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading sources or writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when delimited text cannot be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the merged dataset cannot be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when no source text was provided for one of the exports.
    #[error("no {0} source selected")]
    NoSourceSelected(SourceKind),

    /// Raised when serialization is attempted on an empty record sequence.
    #[error("cannot serialize an empty record set")]
    EmptyInput,

    /// Raised when an export header lacks a column the normalizer reads.
    #[error("{export} export is missing the '{column}' column")]
    MissingColumn { export: SourceKind, column: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
