//! Lending ledger: the only writer of lending activity

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    models::lending::LendingActivity,
    repository::Repository,
};

#[derive(Clone)]
pub struct LedgerService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Lend a copy of `book_id` to `borrower_id`.
    ///
    /// The availability check and the insert run in one transaction that
    /// holds the book locked, so concurrent borrows of the last copy cannot
    /// both succeed.
    pub async fn borrow(&self, book_id: i32, borrower_id: i32) -> AppResult<LendingActivity> {
        let mut tx = self.repository.lendings.begin().await?;

        let mut book = tx.lock_book(book_id).await?;
        let borrower = tx.find_borrower(borrower_id).await?;
        let draft = book.borrow_copy(&borrower, self.clock.now())?;
        let lending = tx.insert_lending(&draft).await?;

        tx.commit().await?;
        Ok(lending)
    }

    /// Close an open loan
    pub async fn return_loan(&self, lending_id: i32) -> AppResult<LendingActivity> {
        let mut tx = self.repository.lendings.begin().await?;

        let mut lending = tx.find_lending(lending_id).await?;
        lending.mark_returned(self.clock.now())?;
        tx.update_lending(&lending).await?;

        tx.commit().await?;
        Ok(lending)
    }

    pub async fn get_lending(&self, lending_id: i32) -> AppResult<LendingActivity> {
        self.repository.lendings.get_by_id(lending_id).await
    }
}
