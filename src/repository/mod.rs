//! Repository layer: the storage contract the services depend on.
//!
//! Two implementations are provided: PostgreSQL (`books`, `borrowers`,
//! `lendings`), which pushes grouping and ordering into SQL, and an
//! in-process [`memory::MemoryStore`] that computes the same results with the
//! functions in [`crate::analytics`].

pub mod books;
pub mod borrowers;
pub mod lendings;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, NewBook},
        borrower::{Borrower, NewBorrower},
        lending::{LendingActivity, LendingHistoryEntry, NewLending},
        report::{BookRanking, CompletedLoans, DateRange, TopBorrower},
    },
};

/// Book storage. Books are always returned with their open loans attached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Get book by ID; `NotFound` if absent
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    /// All books ordered by id
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn insert(&self, book: &NewBook) -> AppResult<Book>;

    /// Persist title, author, publication year and pages
    async fn update(&self, book: &Book) -> AppResult<Book>;

    /// Delete a book; `Conflict` if it has any lending history
    async fn remove(&self, id: i32) -> AppResult<()>;

    /// Books by total loan count, descending, ties by id
    async fn most_borrowed(&self, count: i64) -> AppResult<Vec<BookRanking>>;

    /// Books sharing readers with `book_id`, by distinct shared readers
    async fn also_borrowed(&self, book_id: i32, count: i64) -> AppResult<Vec<BookRanking>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowerRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Borrower>;

    async fn list(&self) -> AppResult<Vec<Borrower>>;

    /// `Conflict` if the email is already registered
    async fn insert(&self, borrower: &NewBorrower) -> AppResult<Borrower>;

    /// `Conflict` if the new email belongs to another borrower
    async fn update(&self, borrower: &Borrower) -> AppResult<Borrower>;

    /// `Conflict` if the borrower has any lending history
    async fn remove(&self, id: i32) -> AppResult<()>;
}

/// Lending history reads and the entry point for ledger writes
#[async_trait]
pub trait LendingRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<LendingActivity>;

    async fn count_open_for_book(&self, book_id: i32) -> AppResult<i64>;

    /// Loans started in `range` by `borrower_id`, newest first
    async fn history_for_borrower(
        &self,
        borrower_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<LendingHistoryEntry>>;

    /// Borrowers by number of loans started in `range`, ties by id
    async fn top_borrowers(&self, range: DateRange, count: i64) -> AppResult<Vec<TopBorrower>>;

    /// Count and summed duration of the book's closed loans
    async fn completed_loans(&self, book_id: i32) -> AppResult<CompletedLoans>;

    /// Start a unit of work for borrow/return
    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>>;
}

/// Unit of work used by the lending ledger.
///
/// A book locked through `lock_book` stays exclusively held until the
/// transaction commits or is dropped, so a capacity check and the insert
/// that follows cannot interleave with another borrow of the same book.
/// Dropping without `commit` discards every write.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Lock the book and load it with its open loans
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Book>;

    async fn find_borrower(&mut self, borrower_id: i32) -> AppResult<Borrower>;

    async fn find_lending(&mut self, lending_id: i32) -> AppResult<LendingActivity>;

    async fn insert_lending(&mut self, lending: &NewLending) -> AppResult<LendingActivity>;

    /// Persist the return timestamp of a closed loan
    async fn update_lending(&mut self, lending: &LendingActivity) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Repository handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
    pub borrowers: Arc<dyn BorrowerRepository>,
    pub lendings: Arc<dyn LendingRepository>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrowers: Arc::new(borrowers::BorrowersRepository::new(pool.clone())),
            lendings: Arc::new(lendings::LendingsRepository::new(pool)),
        }
    }

    /// Create a repository over a fresh process-local store
    pub fn in_memory() -> Self {
        Self::from_memory(memory::MemoryStore::default())
    }

    pub fn from_memory(store: memory::MemoryStore) -> Self {
        Self {
            books: Arc::new(store.clone()),
            borrowers: Arc::new(store.clone()),
            lendings: Arc::new(store),
        }
    }
}

/// Map a unique-constraint violation to `Conflict`
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> crate::error::AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            crate::error::AppError::Conflict(message.into())
        }
        _ => err.into(),
    }
}
