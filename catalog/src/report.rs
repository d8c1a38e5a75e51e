//! Statistics over the catalog: top-N rankings and collection totals.

use chrono::NaiveDate;
use serde::Serialize;
use shelf_index::{count_frequencies, merge_sort_by_key, FieldValue, SortOrder};

use crate::catalog::Catalog;
use crate::record::LoanStatus;

/// One line of a top-N report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub key: String,
    /// Book title or reader name; `None` once the record is gone.
    pub label: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionTotals {
    /// Distinct titles.
    pub titles: usize,
    /// Sum of `quantity` over all titles.
    pub copies: u64,
    /// Sum of `available_quantity` over all titles.
    pub available: u64,
}

impl Catalog {
    /// Most borrowed books over the loan history.
    pub fn top_books(&self, n: Option<usize>) -> Vec<RankedEntry> {
        self.ranked("isbn", n, |isbn| self.books.search(isbn).map(|b| b.title.clone()))
    }

    /// Readers with the most loans.
    pub fn top_readers(&self, n: Option<usize>) -> Vec<RankedEntry> {
        self.ranked("reader_id", n, |id| {
            self.readers.search(id).map(|r| r.name.clone())
        })
    }

    fn ranked(
        &self,
        field: &str,
        n: Option<usize>,
        label: impl Fn(&str) -> Option<String>,
    ) -> Vec<RankedEntry> {
        let n = n.unwrap_or(self.config().top_n);
        let counts = count_frequencies(&self.loans.inorder(), field);
        merge_sort_by_key(&counts, |(_, count)| *count, SortOrder::Descending)
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (value, count))| {
                let key = match value {
                    FieldValue::Text(s) => s,
                    other => other.to_string(),
                };
                RankedEntry {
                    rank: i + 1,
                    label: label(&key),
                    key,
                    count,
                }
            })
            .collect()
    }

    pub fn collection_totals(&self) -> CollectionTotals {
        self.books
            .iter()
            .fold(CollectionTotals::default(), |mut acc, (_, book)| {
                acc.titles += 1;
                acc.copies += u64::from(book.quantity);
                acc.available += u64::from(book.available_quantity);
                acc
            })
    }

    pub fn reader_total(&self) -> usize {
        self.readers.len()
    }

    /// Loans still out on `today`, overdue ones included.
    pub fn on_loan_count(&self, today: NaiveDate) -> usize {
        self.count_status(today, LoanStatus::is_outstanding)
    }

    pub fn overdue_count(&self, today: NaiveDate) -> usize {
        self.count_status(today, |s| s == LoanStatus::Overdue)
    }

    fn count_status(&self, today: NaiveDate, pred: impl Fn(LoanStatus) -> bool) -> usize {
        self.loans
            .iter()
            .filter(|(_, loan)| pred(LoanStatus::at(loan.due_date, loan.return_date, today)))
            .count()
    }
}
