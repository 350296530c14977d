//! Process-local repository.
//!
//! All state lives behind one async mutex. A ledger transaction holds that
//! mutex for its whole lifetime and works on a copy of the state, which
//! replaces the shared state on commit. Rankings come from
//! [`crate::analytics`] so results match the PostgreSQL queries.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BookRepository, BorrowerRepository, LedgerTransaction, LendingRepository};
use crate::{
    analytics,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, NewBook},
        borrower::{Borrower, NewBorrower},
        lending::{LendingActivity, LendingHistoryEntry, NewLending},
        report::{BookRanking, CompletedLoans, DateRange, TopBorrower},
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    books: BTreeMap<i32, Book>,
    borrowers: BTreeMap<i32, Borrower>,
    lendings: BTreeMap<i32, LendingActivity>,
    last_book_id: i32,
    last_borrower_id: i32,
    last_lending_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

impl MemoryState {
    fn book(&self, id: i32) -> AppResult<Book> {
        let book = self
            .books
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        let open = self
            .lendings
            .values()
            .filter(|l| l.book_id() == id && l.is_open())
            .cloned()
            .collect();
        Ok(book.clone().with_loans(open))
    }

    fn borrower(&self, id: i32) -> AppResult<Borrower> {
        self.borrowers
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    fn lending(&self, id: i32) -> AppResult<LendingActivity> {
        self.lendings
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Lending activity {} not found", id)))
    }

    fn all_lendings(&self) -> Vec<LendingActivity> {
        self.lendings.values().cloned().collect()
    }

    fn ranked_books(&self, ranked: Vec<(i32, i64)>) -> AppResult<Vec<BookRanking>> {
        ranked
            .into_iter()
            .map(|(id, borrow_count)| {
                Ok(BookRanking {
                    book: BookDetails::from(&self.book(id)?),
                    borrow_count,
                })
            })
            .collect()
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.borrowers
            .values()
            .any(|b| b.email() == email && Some(b.id()) != except)
    }
}

/// In-memory repository; clones share the same state
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.state.lock().await.book(id)
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        state.books.keys().map(|id| state.book(*id)).collect()
    }

    async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        let id = next_id(&mut state.last_book_id);
        let stored = Book::from_new(id, book.clone());
        state.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&book.id()) {
            return Err(AppError::NotFound(format!("Book with id {} not found", book.id())));
        }
        state.books.insert(book.id(), book.clone().with_loans(Vec::new()));
        state.book(book.id())
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if state.lendings.values().any(|l| l.book_id() == id) {
            return Err(AppError::Conflict(format!(
                "Book {} has lending history and cannot be deleted",
                id
            )));
        }
        state.books.remove(&id);
        Ok(())
    }

    async fn most_borrowed(&self, count: i64) -> AppResult<Vec<BookRanking>> {
        let state = self.state.lock().await;
        let ranked = analytics::most_borrowed(&state.all_lendings(), count.max(0) as usize);
        state.ranked_books(ranked)
    }

    async fn also_borrowed(&self, book_id: i32, count: i64) -> AppResult<Vec<BookRanking>> {
        let state = self.state.lock().await;
        let ranked = analytics::also_borrowed(&state.all_lendings(), book_id, count.max(0) as usize);
        state.ranked_books(ranked)
    }
}

#[async_trait]
impl BorrowerRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        self.state.lock().await.borrower(id)
    }

    async fn list(&self) -> AppResult<Vec<Borrower>> {
        Ok(self.state.lock().await.borrowers.values().cloned().collect())
    }

    async fn insert(&self, borrower: &NewBorrower) -> AppResult<Borrower> {
        let mut state = self.state.lock().await;
        if state.email_taken(borrower.email(), None) {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                borrower.email()
            )));
        }
        let id = next_id(&mut state.last_borrower_id);
        let stored = Borrower::from_new(id, borrower.clone());
        state.borrowers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let mut state = self.state.lock().await;
        if !state.borrowers.contains_key(&borrower.id()) {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                borrower.id()
            )));
        }
        if state.email_taken(borrower.email(), Some(borrower.id())) {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                borrower.email()
            )));
        }
        state.borrowers.insert(borrower.id(), borrower.clone());
        Ok(borrower.clone())
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.borrowers.contains_key(&id) {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }
        if state.lendings.values().any(|l| l.borrower_id() == id) {
            return Err(AppError::Conflict(format!(
                "Borrower {} has lending history and cannot be deleted",
                id
            )));
        }
        state.borrowers.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LendingRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<LendingActivity> {
        self.state.lock().await.lending(id)
    }

    async fn count_open_for_book(&self, book_id: i32) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .lendings
            .values()
            .filter(|l| l.book_id() == book_id && l.is_open())
            .count() as i64)
    }

    async fn history_for_borrower(
        &self,
        borrower_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<LendingHistoryEntry>> {
        let state = self.state.lock().await;
        let mut loans: Vec<&LendingActivity> = state
            .lendings
            .values()
            .filter(|l| l.borrower_id() == borrower_id && range.contains(l.borrowed_at()))
            .collect();
        loans.sort_by(|a, b| b.borrowed_at().cmp(&a.borrowed_at()).then(b.id().cmp(&a.id())));

        loans
            .into_iter()
            .map(|l| {
                Ok(LendingHistoryEntry {
                    lending_id: l.id(),
                    book: BookDetails::from(&state.book(l.book_id())?),
                    borrowed_at: l.borrowed_at(),
                    returned_at: l.returned_at(),
                })
            })
            .collect()
    }

    async fn top_borrowers(&self, range: DateRange, count: i64) -> AppResult<Vec<TopBorrower>> {
        let state = self.state.lock().await;
        analytics::top_borrowers(&state.all_lendings(), &range, count.max(0) as usize)
            .into_iter()
            .map(|(borrower_id, borrow_count)| {
                Ok(TopBorrower {
                    borrower_id,
                    name: state.borrower(borrower_id)?.name().to_string(),
                    borrow_count,
                })
            })
            .collect()
    }

    async fn completed_loans(&self, book_id: i32) -> AppResult<CompletedLoans> {
        let state = self.state.lock().await;
        Ok(analytics::completed_loans(
            state.lendings.values().filter(|l| l.book_id() == book_id),
        ))
    }

    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Holds the store exclusively until committed or dropped
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Book> {
        self.working.book(book_id)
    }

    async fn find_borrower(&mut self, borrower_id: i32) -> AppResult<Borrower> {
        self.working.borrower(borrower_id)
    }

    async fn find_lending(&mut self, lending_id: i32) -> AppResult<LendingActivity> {
        self.working.lending(lending_id)
    }

    async fn insert_lending(&mut self, lending: &NewLending) -> AppResult<LendingActivity> {
        self.working.book(lending.book_id())?;
        self.working.borrower(lending.borrower_id())?;

        let id = next_id(&mut self.working.last_lending_id);
        let stored = LendingActivity::from_new(id, lending);
        self.working.lendings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_lending(&mut self, lending: &LendingActivity) -> AppResult<()> {
        let stored = self
            .working
            .lendings
            .get_mut(&lending.id())
            .ok_or_else(|| AppError::NotFound(format!("Lending activity {} not found", lending.id())))?;
        if !stored.is_open() {
            return Err(AppError::AlreadyReturned(lending.id()));
        }
        *stored = lending.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
