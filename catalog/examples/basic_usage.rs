//! Basic usage of the library catalog.

use chrono::{Days, Local};
use shelf_catalog::{
    init_logging, Book, BookField, BookSort, Catalog, CatalogResult, LoanRow, MemorySource,
    Reader, ReaderSort,
};

fn main() -> CatalogResult<()> {
    init_logging();
    let today = Local::now().date_naive();

    println!("=== Loading rows ===\n");

    let source = MemorySource {
        books: vec![
            Book::new("ISBN00001", "Dune", "Sci-fi", "Frank Herbert", 1965, 3),
            Book::new("ISBN00002", "Emma", "", "Jane Austen", 1815, 1),
            Book::new("ISBN00003", "Beloved", "Novel", "Toni Morrison", 1987, 2),
        ],
        readers: vec![
            Reader::new("RD00001", "Nguyen An", "2001-02-03", "Hanoi"),
            Reader::new("RD00002", "Tran Binh", "1998-07-08", "Hue"),
        ],
        loans: vec![LoanRow {
            loan_id: 1,
            reader_id: "RD00002".into(),
            isbn: "ISBN00001".into(),
            borrow_date: Some((today - Days::new(40)).to_string()),
            due_date: Some((today - Days::new(10)).to_string()),
            return_date: None,
        }],
    };

    let mut catalog = Catalog::new();
    let summary = catalog.reload(&source, today)?;
    println!("{summary:?}");

    println!("\n=== Books by title ===\n");
    for book in catalog.sorted_books(BookSort::TitleAsc) {
        println!("{book}");
    }

    println!("\n=== Readers by name, descending ===\n");
    for reader in catalog.sorted_readers(ReaderSort::NameDesc) {
        println!("{reader}");
    }

    println!("\n=== Search: author contains 'austen' ===\n");
    for book in catalog.search_books(BookField::Author, "austen") {
        println!("{book}");
    }

    println!("\n=== Loans ===\n");
    let first = catalog.create_loan("RD00001", "ISBN00001", today, None)?;
    let second = catalog.create_loan("RD00001", "ISBN00003", today, Some(7))?;
    catalog.return_loan(second, today)?;
    println!("created loans {first} and {second}, returned {second}");

    if let Err(e) = catalog.create_loan("RD00002", "ISBN00002", today, None) {
        println!("unexpected: {e}");
    }
    match catalog.create_loan("RD00001", "ISBN00002", today, None) {
        Ok(id) => println!("loan {id} created"),
        Err(e) => println!("refused: {e}"),
    }

    for loan in catalog.loans_by_due_date() {
        println!(
            "#{} {} -> {} due {} [{}]",
            loan.loan_id, loan.isbn, loan.reader_id, loan.due_date, loan.status
        );
    }

    println!("\n=== Statistics ===\n");
    let totals = catalog.collection_totals();
    println!(
        "{} titles, {} copies, {} on the shelf",
        totals.titles, totals.copies, totals.available
    );
    println!("{} readers", catalog.reader_total());
    println!(
        "{} on loan, {} overdue",
        catalog.on_loan_count(today),
        catalog.overdue_count(today)
    );

    println!("\nTop books:");
    for entry in catalog.top_books(None) {
        println!(
            "  {}. {} ({}) x{}",
            entry.rank,
            entry.label.as_deref().unwrap_or("?"),
            entry.key,
            entry.count
        );
    }

    println!("\nTop readers:");
    for entry in catalog.top_readers(None) {
        println!(
            "  {}. {} ({}) x{}",
            entry.rank,
            entry.label.as_deref().unwrap_or("?"),
            entry.key,
            entry.count
        );
    }

    Ok(())
}
