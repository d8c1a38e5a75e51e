//! Error types for the index containers.

use thiserror::Error;

/// Result type alias using [`IndexError`].
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised while configuring or validating a container.
///
/// Lookups never produce these: an absent key is reported as `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("bucket capacity must be at least 1")]
    ZeroCapacity,

    #[error("max load factor must be positive and finite, got {0}")]
    InvalidLoadFactor(f64),

    #[error("invariant violated at key {key}: {detail}")]
    InvariantViolation { key: String, detail: String },
}

impl IndexError {
    pub(crate) fn invariant(key: impl std::fmt::Debug, detail: impl Into<String>) -> Self {
        IndexError::InvariantViolation {
            key: format!("{key:?}"),
            detail: detail.into(),
        }
    }
}
