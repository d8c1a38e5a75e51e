//! # shelf-index
//!
//! In-memory indexes for library records: books and readers live in a
//! string-keyed chained hash table, loan tickets in an integer-keyed AVL
//! tree, and reports are built with a stable merge sort and a first-seen
//! frequency counter.
//!
//! ## Example
//!
//! ```rust
//! use shelf_index::{merge_sort_by_key, KeyedStore, OrderedIndex, SortOrder};
//!
//! let mut books: KeyedStore<&str> = KeyedStore::new();
//! books.insert("ISBN00002", "Dune");
//! books.insert("ISBN00001", "Emma");
//! assert_eq!(books.search("ISBN00001"), Some(&"Emma"));
//!
//! let mut loans: OrderedIndex<i64, &str> = OrderedIndex::new();
//! loans.insert(20, "RD00002");
//! loans.insert(10, "RD00001");
//! assert_eq!(loans.inorder(), vec![&"RD00001", &"RD00002"]);
//!
//! let titles = merge_sort_by_key(&books.get_all_values(), |t| **t, SortOrder::Ascending);
//! assert_eq!(titles, vec![&"Dune", &"Emma"]);
//! ```
//!
//! All containers are single-threaded and perform no internal locking.

pub mod error;
pub mod keyed_store;
pub mod ordered_index;
pub mod sequencer;

pub use error::{IndexError, IndexResult};
pub use keyed_store::{polynomial_hash, KeyedStore, ResizePolicy, StoreConfig, DEFAULT_CAPACITY};
pub use ordered_index::{DeletePolicy, IndexConfig, OrderedIndex};
pub use sequencer::{
    count_frequencies, count_frequencies_by, merge_sort, merge_sort_by_key, FieldValue, Fields,
    SortOrder,
};

#[cfg(test)]
mod proptests;
