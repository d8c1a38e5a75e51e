//! The catalog session: load, mutate and query books, readers and loans.

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use shelf_index::{merge_sort_by_key, KeyedStore, OrderedIndex, SortOrder, StoreConfig};

use crate::error::{CatalogError, CatalogResult, RecordKind};
use crate::record::{Book, LoanRecord, LoanStatus, Reader, DEFAULT_GENRE};
use crate::source::RecordSource;
use crate::Config;

/// Counts reported by [`Catalog::reload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub books: usize,
    pub readers: usize,
    pub loans: usize,
    /// Book rows failing [`Book::validate`].
    pub skipped_books: usize,
    /// Reader rows failing [`Reader::validate`].
    pub skipped_readers: usize,
    /// Loan rows dropped for missing or malformed dates.
    pub skipped_loans: usize,
}

/// Book attribute matched by [`Catalog::search_books`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Isbn,
    Title,
    Author,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    #[default]
    TitleAsc,
    TitleDesc,
    IsbnAsc,
    IsbnDesc,
}

/// Reader attribute matched by [`Catalog::search_readers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderField {
    Id,
    Name,
    Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderSort {
    #[default]
    NameAsc,
    NameDesc,
    IdAsc,
    IdDesc,
}

/// New values for an existing book. The ISBN is the lookup key and cannot
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub title: String,
    pub genre: String,
    pub author: String,
    pub year: i32,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderUpdate {
    pub name: String,
    pub birth_date: String,
    pub address: String,
}

/// Books, readers and loans indexed in memory.
pub struct Catalog {
    pub(crate) books: KeyedStore<Book>,
    pub(crate) readers: KeyedStore<Reader>,
    pub(crate) loans: OrderedIndex<i64, LoanRecord>,
    next_loan_id: i64,
    config: Config,
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl Catalog {
    /// Creates an empty catalog with the default configuration.
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            books: KeyedStore::new(),
            readers: KeyedStore::new(),
            loans: OrderedIndex::new(),
            next_loan_id: 1,
            config,
        }
    }

    pub fn with_config(config: Config) -> CatalogResult<Self> {
        let books = KeyedStore::with_config(StoreConfig {
            capacity: config.book_capacity,
            resize: config.resize,
        })?;
        let readers = KeyedStore::with_config(StoreConfig {
            capacity: config.reader_capacity,
            resize: config.resize,
        })?;
        let loans = OrderedIndex::with_config(shelf_index::IndexConfig {
            delete_policy: config.delete_policy,
        });
        Ok(Self {
            books,
            readers,
            loans,
            next_loan_id: 1,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn books(&self) -> &KeyedStore<Book> {
        &self.books
    }

    pub fn readers(&self) -> &KeyedStore<Reader> {
        &self.readers
    }

    pub fn loans(&self) -> &OrderedIndex<i64, LoanRecord> {
        &self.loans
    }

    /// Id the next created loan will receive.
    pub fn next_loan_id(&self) -> i64 {
        self.next_loan_id
    }

    /// Replaces the catalog contents with the rows of `source`.
    ///
    /// All rows are fetched before anything is cleared, so a failing source
    /// leaves the catalog as it was. Invalid book and reader rows, and loan
    /// rows without usable borrow or due dates, are skipped with a warning.
    pub fn reload(
        &mut self,
        source: &impl RecordSource,
        today: NaiveDate,
    ) -> CatalogResult<LoadSummary> {
        let book_rows = source.book_rows()?;
        let reader_rows = source.reader_rows()?;
        let loan_rows = source.loan_rows()?;

        let max_loan_id = loan_rows.iter().map(|row| row.loan_id).max().unwrap_or(0);
        let next_loan_id = max_loan_id.checked_add(1).ok_or_else(|| {
            CatalogError::InvalidRecord(format!("loan id {max_loan_id} leaves no next id"))
        })?;

        self.books.clear();
        self.readers.clear();
        self.loans.clear();

        let mut skipped_books = 0;
        for book in book_rows {
            match book.validate() {
                Ok(()) => {
                    self.books.insert(book.isbn.clone(), book);
                }
                Err(e) => {
                    warn!("skipping book row {:?}: {e}", book.isbn);
                    skipped_books += 1;
                }
            }
        }
        let mut skipped_readers = 0;
        for reader in reader_rows {
            match reader.validate() {
                Ok(()) => {
                    self.readers.insert(reader.reader_id.clone(), reader);
                }
                Err(e) => {
                    warn!("skipping reader row {:?}: {e}", reader.reader_id);
                    skipped_readers += 1;
                }
            }
        }

        let mut skipped_loans = 0;
        for row in &loan_rows {
            match row.parse() {
                Ok(loan) => {
                    self.loans.insert(loan.loan_id, loan);
                }
                Err(e) => {
                    warn!("skipping loan row {}: {e}", row.loan_id);
                    skipped_loans += 1;
                }
            }
        }
        self.next_loan_id = next_loan_id;
        self.refresh_statuses(today);

        let summary = LoadSummary {
            books: self.books.len(),
            readers: self.readers.len(),
            loans: self.loans.len(),
            skipped_books,
            skipped_readers,
            skipped_loans,
        };
        info!(
            "catalog reloaded: {} books, {} readers, {} loans ({} rows skipped)",
            summary.books,
            summary.readers,
            summary.loans,
            summary.skipped_books + summary.skipped_readers + summary.skipped_loans
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------ books

    pub fn book(&self, isbn: &str) -> Option<&Book> {
        self.books.search(isbn)
    }

    pub fn add_book(&mut self, book: Book) -> CatalogResult<()> {
        book.validate()?;
        if self.books.contains_key(&book.isbn) {
            return Err(CatalogError::duplicate(RecordKind::Book, &book.isbn));
        }
        debug!("adding book {}", book.isbn);
        self.books.insert(book.isbn.clone(), book);
        Ok(())
    }

    /// Applies `update` to the book. A change of `quantity` shifts
    /// `available_quantity` by the same amount; it cannot drop below the
    /// copies currently on loan.
    pub fn update_book(&mut self, isbn: &str, update: BookUpdate) -> CatalogResult<&Book> {
        let book = self
            .books
            .search_mut(isbn)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Book, isbn))?;
        let out = book.copies_out();
        if update.quantity < out {
            return Err(CatalogError::InvalidRecord(format!(
                "book {isbn}: quantity {} is below the {out} copies on loan",
                update.quantity
            )));
        }
        book.title = update.title;
        book.genre = if update.genre.trim().is_empty() {
            DEFAULT_GENRE.to_owned()
        } else {
            update.genre
        };
        book.author = update.author;
        book.year = update.year;
        book.quantity = update.quantity;
        book.available_quantity = update.quantity - out;
        Ok(&*book)
    }

    pub fn remove_book(&mut self, isbn: &str) -> CatalogResult<Book> {
        self.books
            .delete(isbn)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Book, isbn))
    }

    /// Books whose `field` contains `keyword`, ignoring case.
    pub fn search_books(&self, field: BookField, keyword: &str) -> Vec<&Book> {
        let needle = keyword.trim().to_lowercase();
        self.books
            .iter()
            .map(|(_, book)| book)
            .filter(|book| {
                let hay = match field {
                    BookField::Isbn => &book.isbn,
                    BookField::Title => &book.title,
                    BookField::Author => &book.author,
                };
                contains_ignore_case(hay, &needle)
            })
            .collect()
    }

    pub fn sorted_books(&self, sort: BookSort) -> Vec<&Book> {
        let books = self.books.get_all_values();
        match sort {
            BookSort::TitleAsc => {
                merge_sort_by_key(&books, |b| b.title.to_lowercase(), SortOrder::Ascending)
            }
            BookSort::TitleDesc => {
                merge_sort_by_key(&books, |b| b.title.to_lowercase(), SortOrder::Descending)
            }
            BookSort::IsbnAsc => {
                merge_sort_by_key(&books, |b| b.isbn.clone(), SortOrder::Ascending)
            }
            BookSort::IsbnDesc => {
                merge_sort_by_key(&books, |b| b.isbn.clone(), SortOrder::Descending)
            }
        }
    }

    // ---------------------------------------------------------------- readers

    pub fn reader(&self, reader_id: &str) -> Option<&Reader> {
        self.readers.search(reader_id)
    }

    pub fn add_reader(&mut self, reader: Reader) -> CatalogResult<()> {
        reader.validate()?;
        if self.readers.contains_key(&reader.reader_id) {
            return Err(CatalogError::duplicate(RecordKind::Reader, &reader.reader_id));
        }
        debug!("adding reader {}", reader.reader_id);
        self.readers.insert(reader.reader_id.clone(), reader);
        Ok(())
    }

    pub fn update_reader(&mut self, reader_id: &str, update: ReaderUpdate) -> CatalogResult<&Reader> {
        let reader = self
            .readers
            .search_mut(reader_id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Reader, reader_id))?;
        reader.name = update.name;
        reader.birth_date = update.birth_date;
        reader.address = update.address;
        Ok(&*reader)
    }

    pub fn remove_reader(&mut self, reader_id: &str) -> CatalogResult<Reader> {
        self.readers
            .delete(reader_id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Reader, reader_id))
    }

    pub fn search_readers(&self, field: ReaderField, keyword: &str) -> Vec<&Reader> {
        let needle = keyword.trim().to_lowercase();
        self.readers
            .iter()
            .map(|(_, reader)| reader)
            .filter(|reader| {
                let hay = match field {
                    ReaderField::Id => &reader.reader_id,
                    ReaderField::Name => &reader.name,
                    ReaderField::Address => &reader.address,
                };
                contains_ignore_case(hay, &needle)
            })
            .collect()
    }

    pub fn sorted_readers(&self, sort: ReaderSort) -> Vec<&Reader> {
        let readers = self.readers.get_all_values();
        let (by_name, order) = match sort {
            ReaderSort::NameAsc => (true, SortOrder::Ascending),
            ReaderSort::NameDesc => (true, SortOrder::Descending),
            ReaderSort::IdAsc => (false, SortOrder::Ascending),
            ReaderSort::IdDesc => (false, SortOrder::Descending),
        };
        if by_name {
            merge_sort_by_key(&readers, |r| r.name.to_lowercase(), order)
        } else {
            merge_sort_by_key(&readers, |r| r.reader_id.clone(), order)
        }
    }

    // ------------------------------------------------------------------ loans

    pub fn loan(&self, loan_id: i64) -> Option<&LoanRecord> {
        self.loans.search(&loan_id)
    }

    /// Every loan, ascending by id.
    pub fn all_loans(&self) -> Vec<&LoanRecord> {
        self.loans.inorder()
    }

    pub fn loans_by_due_date(&self) -> Vec<&LoanRecord> {
        merge_sort_by_key(&self.loans.inorder(), |l| l.due_date, SortOrder::Ascending)
    }

    /// Lends one copy of `isbn` to `reader_id` and returns the new loan id.
    ///
    /// `days` defaults to [`Config::loan_period_days`].
    pub fn create_loan(
        &mut self,
        reader_id: &str,
        isbn: &str,
        today: NaiveDate,
        days: Option<u32>,
    ) -> CatalogResult<i64> {
        if !self.readers.contains_key(reader_id) {
            return Err(CatalogError::not_found(RecordKind::Reader, reader_id));
        }
        let book = self
            .books
            .search_mut(isbn)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Book, isbn))?;
        if book.available_quantity == 0 {
            return Err(CatalogError::Unavailable {
                isbn: isbn.to_owned(),
            });
        }
        let days = days.unwrap_or(self.config.loan_period_days);
        let due_date = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| CatalogError::InvalidRecord(format!("loan of {days} days overflows")))?;
        let loan_id = self.next_loan_id;
        let next_loan_id = loan_id.checked_add(1).ok_or_else(|| {
            CatalogError::InvalidRecord(format!("loan id {loan_id} leaves no next id"))
        })?;
        book.available_quantity -= 1;
        self.next_loan_id = next_loan_id;
        let loan = LoanRecord::new(loan_id, reader_id, isbn, today, due_date);
        debug!("loan {loan_id}: {isbn} to {reader_id}, due {due_date}");
        self.loans.insert(loan_id, loan);
        Ok(loan_id)
    }

    /// Marks an unreturned loan as returned and puts the copy back on the
    /// shelf.
    pub fn return_loan(&mut self, loan_id: i64, today: NaiveDate) -> CatalogResult<()> {
        let loan = self
            .loans
            .search_mut(&loan_id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Loan, loan_id))?;
        if loan.return_date.is_some() {
            return Err(CatalogError::NotOnLoan { loan_id });
        }
        loan.return_date = Some(today);
        loan.status = LoanStatus::Returned;

        match self.books.search_mut(&loan.isbn) {
            Some(book) if book.available_quantity < book.quantity => {
                book.available_quantity += 1;
            }
            Some(_) => {}
            None => warn!("loan {loan_id} returned for unknown book {}", loan.isbn),
        }
        Ok(())
    }

    /// Removes a loan record outright (not a return).
    pub fn remove_loan(&mut self, loan_id: i64) -> CatalogResult<LoanRecord> {
        self.loans
            .delete(&loan_id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Loan, loan_id))
    }

    /// Recomputes every loan's status for `today`.
    pub fn refresh_statuses(&mut self, today: NaiveDate) {
        self.loans.for_each_mut(|_, loan| {
            loan.refresh_status(today);
        });
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sample() -> Catalog {
        let mut c = Catalog::new();
        c.add_book(Book::new("ISBN00001", "dune", "Sci-fi", "Herbert", 1965, 2))
            .unwrap();
        c.add_book(Book::new("ISBN00002", "Emma", "", "Austen", 1815, 1))
            .unwrap();
        c.add_book(Book::new("ISBN00003", "Beloved", "Novel", "Morrison", 1987, 1))
            .unwrap();
        c.add_reader(Reader::new("RD00001", "Binh", "2000-01-01", "Hue"))
            .unwrap();
        c.add_reader(Reader::new("RD00002", "an", "1999-05-05", "Hanoi"))
            .unwrap();
        c
    }

    #[test]
    fn test_duplicate_book_rejected() {
        let mut c = sample();
        let err = c
            .add_book(Book::new("ISBN00001", "Other", "", "x", 2000, 1))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { kind: RecordKind::Book, .. }));
        assert_eq!(c.book("ISBN00001").unwrap().title, "dune");
        assert_eq!(c.book("ISBN00002").unwrap().genre, DEFAULT_GENRE);
    }

    #[test]
    fn test_update_book_shifts_availability() {
        let mut c = sample();
        c.create_loan("RD00001", "ISBN00001", day(1), None).unwrap();
        let update = BookUpdate {
            title: "Dune".into(),
            genre: "".into(),
            author: "Frank Herbert".into(),
            year: 1965,
            quantity: 5,
        };
        let book = c.update_book("ISBN00001", update.clone()).unwrap();
        assert_eq!(book.available_quantity, 4);
        assert_eq!(book.genre, DEFAULT_GENRE);

        let too_few = BookUpdate {
            quantity: 0,
            ..update.clone()
        };
        assert!(matches!(
            c.update_book("ISBN00001", too_few),
            Err(CatalogError::InvalidRecord(_))
        ));
        assert!(matches!(
            c.update_book("nope", update),
            Err(CatalogError::NotFound { kind: RecordKind::Book, .. })
        ));
    }

    #[test]
    fn test_search_and_sort_books() {
        let c = sample();
        assert_eq!(c.search_books(BookField::Title, "  E ").len(), 3);
        assert!(c.search_books(BookField::Author, "austen").len() == 1);
        assert!(c.search_books(BookField::Isbn, "9999").is_empty());

        let titles = |sort: BookSort| -> Vec<String> {
            c.sorted_books(sort).iter().map(|b| b.title.clone()).collect()
        };
        assert_eq!(titles(BookSort::TitleAsc), vec!["Beloved", "dune", "Emma"]);
        assert_eq!(titles(BookSort::TitleDesc), vec!["Emma", "dune", "Beloved"]);
        let isbns: Vec<&str> = c
            .sorted_books(BookSort::IsbnDesc)
            .iter()
            .map(|b| b.isbn.as_str())
            .collect();
        assert_eq!(isbns, vec!["ISBN00003", "ISBN00002", "ISBN00001"]);
    }

    #[test]
    fn test_readers() {
        let mut c = sample();
        let names: Vec<&str> = c
            .sorted_readers(ReaderSort::NameAsc)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["an", "Binh"]);
        assert_eq!(c.search_readers(ReaderField::Address, "HA").len(), 1);

        c.update_reader(
            "RD00002",
            ReaderUpdate {
                name: "An Nguyen".into(),
                birth_date: "1999-05-05".into(),
                address: "Da Nang".into(),
            },
        )
        .unwrap();
        assert_eq!(c.reader("RD00002").unwrap().address, "Da Nang");

        assert!(c.add_reader(Reader::new("RD00001", "x", "y", "z")).is_err());
        assert!(c.remove_reader("RD00001").is_ok());
        assert!(matches!(
            c.remove_reader("RD00001"),
            Err(CatalogError::NotFound { kind: RecordKind::Reader, .. })
        ));
    }

    #[test]
    fn test_loan_lifecycle() {
        let mut c = sample();
        let id = c.create_loan("RD00001", "ISBN00002", day(1), Some(7)).unwrap();
        assert_eq!(id, 1);
        assert_eq!(c.next_loan_id(), 2);
        let loan = c.loan(id).unwrap();
        assert_eq!(loan.due_date, day(8));
        assert_eq!(loan.status, LoanStatus::OnLoan);
        assert_eq!(c.book("ISBN00002").unwrap().available_quantity, 0);

        assert!(matches!(
            c.create_loan("RD00002", "ISBN00002", day(1), None),
            Err(CatalogError::Unavailable { .. })
        ));

        c.refresh_statuses(day(9));
        assert_eq!(c.loan(id).unwrap().status, LoanStatus::Overdue);

        // Overdue loans can still be returned.
        c.return_loan(id, day(10)).unwrap();
        assert_eq!(c.loan(id).unwrap().status, LoanStatus::Returned);
        assert_eq!(c.book("ISBN00002").unwrap().available_quantity, 1);
        assert!(matches!(
            c.return_loan(id, day(11)),
            Err(CatalogError::NotOnLoan { loan_id: 1 })
        ));
        assert!(matches!(
            c.return_loan(99, day(11)),
            Err(CatalogError::NotFound { kind: RecordKind::Loan, .. })
        ));
    }

    #[test]
    fn test_loan_requires_known_reader_and_book() {
        let mut c = sample();
        assert!(matches!(
            c.create_loan("RD09999", "ISBN00001", day(1), None),
            Err(CatalogError::NotFound { kind: RecordKind::Reader, .. })
        ));
        assert!(matches!(
            c.create_loan("RD00001", "ISBN09999", day(1), None),
            Err(CatalogError::NotFound { kind: RecordKind::Book, .. })
        ));
        assert_eq!(c.next_loan_id(), 1);
        assert!(c.all_loans().is_empty());
    }

    #[test]
    fn test_default_loan_period_and_due_order() {
        let mut c = sample();
        let a = c.create_loan("RD00001", "ISBN00001", day(5), None).unwrap();
        let b = c.create_loan("RD00002", "ISBN00003", day(1), Some(2)).unwrap();
        assert_eq!(c.loan(a).unwrap().due_date, NaiveDate::from_ymd_opt(2024, 4, 4).unwrap());
        let due: Vec<i64> = c.loans_by_due_date().iter().map(|l| l.loan_id).collect();
        assert_eq!(due, vec![b, a]);

        assert!(c.remove_loan(a).is_ok());
        assert!(c.remove_loan(a).is_err());
        assert_eq!(c.all_loans().len(), 1);
    }

    #[test]
    fn test_create_loan_at_last_id_leaves_copy() {
        let mut c = sample();
        c.next_loan_id = i64::MAX;
        assert!(matches!(
            c.create_loan("RD00001", "ISBN00001", day(1), None),
            Err(CatalogError::InvalidRecord(_))
        ));
        assert_eq!(c.book("ISBN00001").unwrap().available_quantity, 2);
        assert!(c.all_loans().is_empty());
        assert_eq!(c.next_loan_id(), i64::MAX);
    }

    #[test]
    fn test_with_config_validates() {
        let config = Config {
            book_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            Catalog::with_config(config),
            Err(CatalogError::Index(shelf_index::IndexError::ZeroCapacity))
        ));
    }
}
