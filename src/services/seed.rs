//! Sample data for empty stores.
//!
//! Loans are replayed through the ledger with a [`ManualClock`] set to past
//! dates, so seeded history obeys the same capacity rules as live traffic.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    clock::ManualClock,
    error::AppResult,
    models::{book::NewBook, borrower::NewBorrower},
    repository::Repository,
    services::ledger::LedgerService,
};

const BORROWERS: &[(&str, &str)] = &[
    ("Alice Smith", "alice@example.com"),
    ("Bob Johnson", "bob@example.com"),
    ("Charlie Brown", "charlie@example.com"),
];

/// Title, author, publication year, pages, copies
const BOOKS: &[(&str, &str, i32, i32, i32)] = &[
    ("1984", "George Orwell", 1949, 328, 3),
    ("Demons", "Fyodor Dostoevsky", 1872, 736, 2),
    ("The Communist Manifesto", "Karl Marx & Friedrich Engels", 1848, 120, 5),
    ("The Metamorphosis", "Franz Kafka", 1915, 200, 4),
    ("Theaetetus", "Plato", -369, 250, 2),
    ("Phaedo", "Plato", -370, 200, 3),
    ("A Treatise of Human Nature", "David Hume", 1739, 700, 2),
    ("Laws", "Plato", -348, 450, 1),
];

/// Book index, borrower index, borrowed days ago, returned days ago
const LOANS: &[(usize, usize, i64, Option<i64>)] = &[
    (0, 0, 30, Some(15)),
    (1, 0, 14, Some(2)),
    (3, 0, 40, Some(30)),
    (4, 1, 25, Some(10)),
    (5, 1, 9, Some(1)),
    (6, 1, 50, Some(20)),
    (0, 1, 60, Some(50)),
    (2, 2, 5, None),
];

/// Summary of what a seeding run created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub books: usize,
    pub borrowers: usize,
    pub lendings: usize,
}

/// Populate the store with sample books, borrowers and loan history.
///
/// Does nothing if any book or borrower already exists. Loan dates are
/// relative to `now`.
pub async fn seed_sample_data(repository: &Repository, now: DateTime<Utc>) -> AppResult<SeedReport> {
    if !repository.books.list().await?.is_empty() || !repository.borrowers.list().await?.is_empty() {
        tracing::info!("Store already holds data, skipping seed");
        return Ok(SeedReport::default());
    }

    let mut borrower_ids = Vec::with_capacity(BORROWERS.len());
    for (name, email) in BORROWERS {
        let borrower = repository.borrowers.insert(&NewBorrower::new(name, email)?).await?;
        borrower_ids.push(borrower.id());
    }

    let mut book_ids = Vec::with_capacity(BOOKS.len());
    for (title, author, year, pages, copies) in BOOKS {
        let new = NewBook::new(title, author, *year, *pages, *copies)?;
        book_ids.push(repository.books.insert(&new).await?.id());
    }

    let clock = ManualClock::new(now);
    let ledger = LedgerService::new(repository.clone(), Arc::new(clock.clone()));
    for (book, borrower, borrowed_ago, returned_ago) in LOANS {
        clock.set(now - Duration::days(*borrowed_ago));
        let loan = ledger.borrow(book_ids[*book], borrower_ids[*borrower]).await?;
        if let Some(days) = returned_ago {
            clock.set(now - Duration::days(*days));
            ledger.return_loan(loan.id()).await?;
        }
    }

    let report = SeedReport {
        books: book_ids.len(),
        borrowers: borrower_ids.len(),
        lendings: LOANS.len(),
    };
    tracing::info!(
        books = report.books,
        borrowers = report.borrowers,
        lendings = report.lendings,
        "Seeded sample data"
    );
    Ok(report)
}
