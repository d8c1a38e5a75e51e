//! # shelf-catalog
//!
//! Library catalog session built on `shelf-index`.
//!
//! ## Architecture
//!
//! A [`Catalog`] owns three in-memory indexes:
//!
//! 1. **Books**: a chained hash table keyed by ISBN.
//! 2. **Readers**: a chained hash table keyed by reader id.
//! 3. **Loans**: an AVL tree keyed by loan id.
//!
//! The catalog is filled from a [`RecordSource`] on reload and mutated in
//! response to user actions. Persisting those mutations is the caller's job;
//! the catalog holds no connection to any store.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use shelf_catalog::{Book, Catalog, Reader};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let mut catalog = Catalog::new();
//! catalog.add_book(Book::new("ISBN00001", "Dune", "Sci-fi", "Herbert", 1965, 2)).unwrap();
//! catalog.add_reader(Reader::new("RD00001", "An", "2000-01-01", "Hanoi")).unwrap();
//!
//! let loan_id = catalog.create_loan("RD00001", "ISBN00001", today, None).unwrap();
//! assert_eq!(catalog.book("ISBN00001").unwrap().available_quantity, 1);
//! assert_eq!(catalog.on_loan_count(today), 1);
//!
//! catalog.return_loan(loan_id, today).unwrap();
//! assert_eq!(catalog.on_loan_count(today), 0);
//! ```

pub mod catalog;
pub mod error;
pub mod logging;
pub mod record;
pub mod report;
pub mod source;

pub use catalog::{BookField, BookSort, BookUpdate, Catalog, LoadSummary, ReaderField, ReaderSort, ReaderUpdate};
pub use error::{CatalogError, CatalogResult, RecordKind};
pub use logging::init_logging;
pub use record::{Book, LoanRecord, LoanStatus, Reader};
pub use report::{CollectionTotals, RankedEntry};
pub use source::{MemorySource, LoanRow, RecordSource};

use shelf_index::{DeletePolicy, ResizePolicy, DEFAULT_CAPACITY};

/// Configuration for a [`Catalog`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Bucket count of the book table
    pub book_capacity: usize,
    /// Bucket count of the reader table
    pub reader_capacity: usize,
    /// Whether the hash tables may grow
    pub resize: ResizePolicy,
    /// Whether loan deletion rotates the tree
    pub delete_policy: DeletePolicy,
    /// Loan length used when a loan is created without one
    pub loan_period_days: u32,
    /// Default cut-off for the top-N reports
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            book_capacity: DEFAULT_CAPACITY,
            reader_capacity: DEFAULT_CAPACITY,
            resize: ResizePolicy::Fixed,
            delete_policy: DeletePolicy::HeightOnly,
            loan_period_days: 30,
            top_n: 10,
        }
    }
}
