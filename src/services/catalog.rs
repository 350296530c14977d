//! Book catalog service

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, CreateBook, NewBook, UpdateBook},
        report::BookAvailability,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let books = self.repository.books.list().await?;
        Ok(books.iter().map(BookDetails::from).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        Ok(BookDetails::from(&book))
    }

    pub async fn create(&self, data: &CreateBook) -> AppResult<BookDetails> {
        let new = NewBook::try_from(data)?;
        let book = self.repository.books.insert(&new).await?;
        Ok(BookDetails::from(&book))
    }

    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails> {
        let mut book = self.repository.books.get_by_id(id).await?;
        book.apply_update(data)?;
        let book = self.repository.books.update(&book).await?;
        Ok(BookDetails::from(&book))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.remove(id).await
    }

    /// Copies on the shelf vs. out on loan
    pub async fn availability(&self, id: i32) -> AppResult<BookAvailability> {
        let book = self.repository.books.get_by_id(id).await?;
        let borrowed = self.repository.lendings.count_open_for_book(id).await? as i32;

        Ok(BookAvailability {
            book_id: book.id(),
            total_copies: book.total_copies(),
            borrowed_copies: borrowed,
            available_copies: book.total_copies() - borrowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        repository::{memory::MemoryStore, MockBookRepository},
    };
    use std::sync::Arc;

    fn create_request(title: &str, copies: i32) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: "Franz Kafka".to_string(),
            publication_year: 1915,
            pages: 200,
            total_copies: copies,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_reports_all_copies_available() {
        let catalog = CatalogService::new(Repository::in_memory());
        let created = catalog.create(&create_request("The Metamorphosis", 4)).await.unwrap();

        let fetched = catalog.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.available_copies, 4);

        let availability = catalog.availability(created.id).await.unwrap();
        assert_eq!(availability.borrowed_copies, 0);
        assert_eq!(availability.available_copies, 4);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_book() {
        let catalog = CatalogService::new(Repository::in_memory());
        let err = catalog.create(&create_request("", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_fields_but_not_copies() {
        let catalog = CatalogService::new(Repository::in_memory());
        let created = catalog.create(&create_request("Metamorphosis", 4)).await.unwrap();

        let update = UpdateBook {
            title: Some("The Metamorphosis".into()),
            publication_year: Some(1916),
            ..Default::default()
        };
        let updated = catalog.update(created.id, &update).await.unwrap();
        assert_eq!(updated.title, "The Metamorphosis");
        assert_eq!(updated.publication_year, 1916);
        assert_eq!(updated.total_copies, 4);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let catalog = CatalogService::new(Repository::in_memory());
        assert!(matches!(catalog.get_by_id(7).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.delete(7).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.availability(7).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rejected_by_domain_never_reaches_storage() {
        let mut books = MockBookRepository::new();
        books.expect_get_by_id().returning(|id| {
            let new = NewBook::new("Phaedo", "Plato", -370, 200, 3).unwrap();
            Ok(crate::models::book::Book::from_new(id, new))
        });
        books.expect_update().never();

        let store = MemoryStore::default();
        let repository = Repository {
            books: Arc::new(books),
            ..Repository::from_memory(store)
        };
        let catalog = CatalogService::new(repository);

        let update = UpdateBook {
            author: Some("   ".into()),
            ..Default::default()
        };
        let err = catalog.update(1, &update).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_surfaces_conflict_from_storage() {
        let mut books = MockBookRepository::new();
        books
            .expect_remove()
            .withf(|id| *id == 3)
            .returning(|id| Err(AppError::Conflict(format!("Book {} has lending history", id))));

        let repository = Repository {
            books: Arc::new(books),
            ..Repository::in_memory()
        };
        let catalog = CatalogService::new(repository);
        assert!(matches!(catalog.delete(3).await, Err(AppError::Conflict(_))));
    }
}
