//! Application-level errors

use std::path::PathBuf;
use thiserror::Error;

/// Application errors: input loading and settings.
///
/// The engine itself fails soft, so domain errors never reach this layer.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
