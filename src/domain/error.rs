//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed values handed to the engine.
///
/// The pipeline itself fails soft; these surface only from explicit parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed composite identifier: {0:?}")]
    MalformedIdentifier(String),

    #[error("invalid level in composite identifier: {0:?}")]
    InvalidLevel(String),

    #[error("invalid node id in composite identifier: {0:?}")]
    InvalidNodeId(String),
}
