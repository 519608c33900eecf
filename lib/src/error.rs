//! Error types shared across the crate.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, TransferError>;

/// Error type for data loading, scaling, training and prediction.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Empty or malformed input batch, or a split too small to be meaningful.
    ///
    /// Raised before any scaling or training begins; fatal to the run.
    #[error("Data error: {0}")]
    Data(String),

    /// Non-finite value in inputs, targets, a computed loss or updated parameters.
    ///
    /// Mid-training this aborts the run before the offending epoch is committed.
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Malformed single-value prediction request. The trained model stays usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Column count differs from the one seen during fit.
    #[error("Feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
