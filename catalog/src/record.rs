//! Records held by the catalog indexes.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shelf_index::{FieldValue, Fields};

use crate::error::{CatalogError, CatalogResult};

/// Genre stored when none is given.
pub const DEFAULT_GENRE: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub genre: String,
    pub author: String,
    pub year: i32,
    pub quantity: u32,
    pub available_quantity: u32,
}

impl Book {
    /// A new title with every copy on the shelf.
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        genre: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        quantity: u32,
    ) -> Self {
        let genre = genre.into();
        let genre = if genre.trim().is_empty() {
            DEFAULT_GENRE.to_owned()
        } else {
            genre
        };
        Self {
            isbn: isbn.into(),
            title: title.into(),
            genre,
            author: author.into(),
            year,
            quantity,
            available_quantity: quantity,
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.isbn.trim().is_empty() {
            return Err(CatalogError::InvalidRecord("book ISBN is empty".into()));
        }
        if self.available_quantity > self.quantity {
            return Err(CatalogError::InvalidRecord(format!(
                "book {}: {} available out of {} copies",
                self.isbn, self.available_quantity, self.quantity
            )));
        }
        Ok(())
    }

    /// Copies currently out on loan.
    pub fn copies_out(&self) -> u32 {
        self.quantity.saturating_sub(self.available_quantity)
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | {} | {} | {}",
            self.isbn,
            self.title,
            self.genre,
            self.author,
            self.year,
            self.quantity,
            self.available_quantity
        )
    }
}

impl Fields for Book {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "isbn" => self.isbn.as_str().into(),
            "title" => self.title.as_str().into(),
            "genre" => self.genre.as_str().into(),
            "author" => self.author.as_str().into(),
            "year" => i64::from(self.year).into(),
            "quantity" => i64::from(self.quantity).into(),
            "available_quantity" => i64::from(self.available_quantity).into(),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub reader_id: String,
    pub name: String,
    pub birth_date: String,
    pub address: String,
}

impl Reader {
    pub fn new(
        reader_id: impl Into<String>,
        name: impl Into<String>,
        birth_date: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            reader_id: reader_id.into(),
            name: name.into(),
            birth_date: birth_date.into(),
            address: address.into(),
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.reader_id.trim().is_empty() {
            return Err(CatalogError::InvalidRecord("reader id is empty".into()));
        }
        Ok(())
    }
}

impl fmt::Display for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.reader_id, self.name, self.birth_date, self.address
        )
    }
}

impl Fields for Reader {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "reader_id" => self.reader_id.as_str().into(),
            "name" => self.name.as_str().into(),
            "birth_date" => self.birth_date.as_str().into(),
            "address" => self.address.as_str().into(),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoanStatus {
    #[default]
    OnLoan,
    Returned,
    Overdue,
}

impl LoanStatus {
    /// Status of a loan as seen on `today`.
    pub fn at(due_date: NaiveDate, return_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        if return_date.is_some() {
            LoanStatus::Returned
        } else if due_date < today {
            LoanStatus::Overdue
        } else {
            LoanStatus::OnLoan
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Returned => "Returned",
            LoanStatus::Overdue => "Overdue",
        }
    }

    /// Whether the copy is still out of the library.
    pub fn is_outstanding(self) -> bool {
        matches!(self, LoanStatus::OnLoan | LoanStatus::Overdue)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: i64,
    pub reader_id: String,
    pub isbn: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl LoanRecord {
    /// An open loan.
    pub fn new(
        loan_id: i64,
        reader_id: impl Into<String>,
        isbn: impl Into<String>,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            loan_id,
            reader_id: reader_id.into(),
            isbn: isbn.into(),
            borrow_date,
            due_date,
            return_date: None,
            status: LoanStatus::OnLoan,
        }
    }

    /// Recomputes `status` for `today`; returns the new status.
    pub fn refresh_status(&mut self, today: NaiveDate) -> LoanStatus {
        self.status = LoanStatus::at(self.due_date, self.return_date, today);
        self.status
    }
}

impl Fields for LoanRecord {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "loan_id" => self.loan_id.into(),
            "reader_id" => self.reader_id.as_str().into(),
            "isbn" => self.isbn.as_str().into(),
            "borrow_date" => self.borrow_date.to_string().into(),
            "due_date" => self.due_date.to_string().into(),
            "return_date" => self.return_date.map(|d| d.to_string()).into(),
            "status" => self.status.as_str().into(),
            _ => return None,
        })
    }
}
