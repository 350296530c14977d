//! Borrower registry service

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        borrower::{Borrower, CreateBorrower, NewBorrower, UpdateBorrower},
        lending::LendingHistoryEntry,
        report::DateRange,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        self.repository.borrowers.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateBorrower) -> AppResult<Borrower> {
        let new = NewBorrower::try_from(data)?;
        self.repository.borrowers.insert(&new).await
    }

    pub async fn update(&self, id: i32, data: &UpdateBorrower) -> AppResult<Borrower> {
        let mut borrower = self.repository.borrowers.get_by_id(id).await?;
        borrower.apply_update(data)?;
        self.repository.borrowers.update(&borrower).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.borrowers.remove(id).await
    }

    /// Loans started by the borrower within `[start, end]`, newest first
    pub async fn history(
        &self,
        id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LendingHistoryEntry>> {
        let range = DateRange::new(start, end)?;
        self.repository.borrowers.get_by_id(id).await?;
        self.repository.lendings.history_for_borrower(id, range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::AppError,
        models::book::NewBook,
        repository::MockBorrowerRepository,
        services::ledger::LedgerService,
    };
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn request(name: &str, email: &str) -> CreateBorrower {
        CreateBorrower {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_must_be_unique() {
        let service = BorrowersService::new(Repository::in_memory());
        service.create(&request("Alice", "alice@example.com")).await.unwrap();
        let bob = service.create(&request("Bob", "bob@example.com")).await.unwrap();

        let err = service
            .create(&request("Alice Two", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let update = UpdateBorrower {
            email: Some("alice@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(bob.id(), &update).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(service.get_by_id(bob.id()).await.unwrap().email(), "bob@example.com");
    }

    #[tokio::test]
    async fn test_invalid_borrower_never_reaches_storage() {
        let mut borrowers = MockBorrowerRepository::new();
        borrowers.expect_insert().never();
        let repository = Repository {
            borrowers: Arc::new(borrowers),
            ..Repository::in_memory()
        };

        let service = BorrowersService::new(repository);
        let err = service.create(&request(" ", "x@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_is_windowed_and_newest_first() {
        let repository = Repository::in_memory();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let ledger = LedgerService::new(repository.clone(), Arc::new(clock.clone()));
        let service = BorrowersService::new(repository.clone());

        let alice = service.create(&request("Alice", "alice@example.com")).await.unwrap();
        let mut books = Vec::new();
        for title in ["1984", "Demons", "Phaedo"] {
            let new = NewBook::new(title, "Author", 1900, 100, 1).unwrap();
            books.push(repository.books.insert(&new).await.unwrap().id());
        }

        for (offset, book) in [(1, books[0]), (5, books[1]), (40, books[2])] {
            clock.set(start + Duration::days(offset));
            ledger.borrow(book, alice.id()).await.unwrap();
        }

        let history = service
            .history(alice.id(), start, start + Duration::days(30))
            .await
            .unwrap();
        let titles: Vec<&str> = history.iter().map(|h| h.book.title.as_str()).collect();
        assert_eq!(titles, vec!["Demons", "1984"]);
        assert!(history.iter().all(|h| h.returned_at.is_none()));
    }

    #[tokio::test]
    async fn test_history_validates_range_and_borrower() {
        let service = BorrowersService::new(Repository::in_memory());
        let now = Utc::now();
        assert!(matches!(
            service.history(1, now, now).await,
            Err(AppError::InvalidRange(_))
        ));
        assert!(matches!(
            service.history(1, now - Duration::days(1), now).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_borrower_with_history_cannot_be_deleted() {
        let repository = Repository::in_memory();
        let ledger = LedgerService::new(repository.clone(), Arc::new(crate::clock::SystemClock));
        let service = BorrowersService::new(repository.clone());

        let alice = service.create(&request("Alice", "alice@example.com")).await.unwrap();
        let carol = service.create(&request("Carol", "carol@example.com")).await.unwrap();
        let book = repository
            .books
            .insert(&NewBook::new("Laws", "Plato", -348, 450, 1).unwrap())
            .await
            .unwrap();
        ledger.borrow(book.id(), alice.id()).await.unwrap();

        assert!(matches!(service.delete(alice.id()).await, Err(AppError::Conflict(_))));
        service.delete(carol.id()).await.unwrap();
        assert!(matches!(service.get_by_id(carol.id()).await, Err(AppError::NotFound(_))));
    }
}
