//! Boundary towards the backing store.
//!
//! The catalog never talks to a database itself. A [`RecordSource`] hands
//! over the persisted rows on reload; writing mutations back is up to the
//! caller.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::record::{Book, LoanRecord, Reader};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a stored date, accepting either a full timestamp or a bare date.
pub fn parse_date(raw: &str) -> CatalogResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, DATE_FORMAT))
        .map_err(|e| CatalogError::InvalidRecord(format!("bad date {raw:?}: {e}")))
}

/// A loan as persisted: dates are still raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRow {
    pub loan_id: i64,
    pub reader_id: String,
    pub isbn: String,
    pub borrow_date: Option<String>,
    pub due_date: Option<String>,
    pub return_date: Option<String>,
}

impl LoanRow {
    /// Builds the loan record. Borrow and due dates are required.
    pub fn parse(&self) -> CatalogResult<LoanRecord> {
        let required = |field: &Option<String>, name: &str| match field.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_date(raw),
            _ => Err(CatalogError::InvalidRecord(format!(
                "loan {} has no {name}",
                self.loan_id
            ))),
        };
        let borrow_date = required(&self.borrow_date, "borrow date")?;
        let due_date = required(&self.due_date, "due date")?;
        let return_date = match self.return_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_date(raw)?),
            _ => None,
        };
        let mut loan = LoanRecord::new(
            self.loan_id,
            self.reader_id.as_str(),
            self.isbn.as_str(),
            borrow_date,
            due_date,
        );
        loan.return_date = return_date;
        Ok(loan)
    }
}

impl From<&LoanRecord> for LoanRow {
    fn from(loan: &LoanRecord) -> Self {
        Self {
            loan_id: loan.loan_id,
            reader_id: loan.reader_id.clone(),
            isbn: loan.isbn.clone(),
            borrow_date: Some(loan.borrow_date.format(DATE_FORMAT).to_string()),
            due_date: Some(loan.due_date.format(DATE_FORMAT).to_string()),
            return_date: loan
                .return_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}

/// Supplies persisted rows for a full reload.
pub trait RecordSource {
    fn book_rows(&self) -> CatalogResult<Vec<Book>>;
    fn reader_rows(&self) -> CatalogResult<Vec<Reader>>;
    fn loan_rows(&self) -> CatalogResult<Vec<LoanRow>>;
}

/// Rows kept in memory. Used for tests, demos and benchmarks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySource {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub readers: Vec<Reader>,
    #[serde(default)]
    pub loans: Vec<LoanRow>,
}

impl RecordSource for MemorySource {
    fn book_rows(&self) -> CatalogResult<Vec<Book>> {
        Ok(self.books.clone())
    }

    fn reader_rows(&self) -> CatalogResult<Vec<Reader>> {
        Ok(self.readers.clone())
    }

    fn loan_rows(&self) -> CatalogResult<Vec<LoanRow>> {
        Ok(self.loans.clone())
    }
}
