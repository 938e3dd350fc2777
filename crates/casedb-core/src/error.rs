//! Core error types.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Core engine errors.
///
/// Lookups that match nothing, unmapped positions and non-cacheable reference
/// shapes are not errors; they surface as empty sets, `None` or `false`.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Error raised by a foreign record store or relationship index.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// A tree reference could not be parsed.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A batch was requested from a queue with nothing left in it.
    #[error("predicate queue is empty")]
    EmptyPredicateQueue,
}
