//! Error types for catalog operations.

use shelf_index::IndexError;
use thiserror::Error;

/// Result type alias using [`CatalogError`].
pub type CatalogResult<T> = Result<T, CatalogError>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Book,
    Reader,
    Loan,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RecordKind::Book => "book",
            RecordKind::Reader => "reader",
            RecordKind::Loan => "loan",
        })
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} {key} not found")]
    NotFound { kind: RecordKind, key: String },

    #[error("{kind} {key} already exists")]
    Duplicate { kind: RecordKind, key: String },

    #[error("no copy of {isbn} is available")]
    Unavailable { isbn: String },

    #[error("loan {loan_id} is not on loan")]
    NotOnLoan { loan_id: i64 },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("record source failed: {0}")]
    Source(String),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl CatalogError {
    pub(crate) fn not_found(kind: RecordKind, key: impl ToString) -> Self {
        CatalogError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: RecordKind, key: impl ToString) -> Self {
        CatalogError::Duplicate {
            kind,
            key: key.to_string(),
        }
    }
}
