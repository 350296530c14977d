//! Book aggregate and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    borrower::Borrower,
    lending::{LendingActivity, NewLending},
    require_text,
};
use crate::error::{AppError, AppResult};

/// A catalogued title and its physical copies.
///
/// The aggregate carries the loans it was loaded with (the repository always
/// loads every open loan) plus any loan staged by [`Book::borrow_copy`]
/// during the current operation. Available copies are derived from those,
/// never stored.
#[derive(Debug, Clone, FromRow)]
pub struct Book {
    id: i32,
    title: String,
    author: String,
    publication_year: i32,
    pages: i32,
    total_copies: i32,
    #[sqlx(skip)]
    loans: Vec<LendingActivity>,
    #[sqlx(skip)]
    staged: Vec<NewLending>,
}

impl Book {
    /// Materialize a stored book from its validated draft
    pub(crate) fn from_new(id: i32, new: NewBook) -> Self {
        Self {
            id,
            title: new.title,
            author: new.author,
            publication_year: new.publication_year,
            pages: new.pages,
            total_copies: new.total_copies,
            loans: Vec::new(),
            staged: Vec::new(),
        }
    }

    /// Attach the loans read alongside this book
    pub(crate) fn with_loans(mut self, loans: Vec<LendingActivity>) -> Self {
        self.loans = loans;
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publication_year(&self) -> i32 {
        self.publication_year
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn total_copies(&self) -> i32 {
        self.total_copies
    }

    pub fn loans(&self) -> &[LendingActivity] {
        &self.loans
    }

    /// Copies currently out, including loans staged on this aggregate
    pub fn open_loans(&self) -> i32 {
        let loaded = self.loans.iter().filter(|l| l.is_open()).count();
        (loaded + self.staged.len()) as i32
    }

    pub fn available_copies(&self) -> i32 {
        self.total_copies - self.open_loans()
    }

    /// Lend one copy to `borrower`.
    ///
    /// Fails with `CapacityExceeded` when every copy is already out; nothing
    /// is staged in that case.
    pub fn borrow_copy(&mut self, borrower: &Borrower, now: DateTime<Utc>) -> AppResult<NewLending> {
        if self.open_loans() >= self.total_copies {
            return Err(AppError::CapacityExceeded(self.title.clone()));
        }

        let lending = NewLending::new(self.id, borrower.id(), now);
        self.staged.push(lending.clone());
        Ok(lending)
    }

    /// Apply an update command. All provided fields are validated before any
    /// is written; total copies are fixed at creation.
    pub fn apply_update(&mut self, update: &UpdateBook) -> AppResult<()> {
        let title = update
            .title
            .as_deref()
            .map(|t| require_text(t, "Title cannot be empty."))
            .transpose()?;
        let author = update
            .author
            .as_deref()
            .map(|a| require_text(a, "Author cannot be empty."))
            .transpose()?;
        if let Some(pages) = update.pages {
            check_pages(pages)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(author) = author {
            self.author = author;
        }
        if let Some(year) = update.publication_year {
            self.publication_year = year;
        }
        if let Some(pages) = update.pages {
            self.pages = pages;
        }
        Ok(())
    }
}

/// A validated book that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    title: String,
    author: String,
    publication_year: i32,
    pages: i32,
    total_copies: i32,
}

impl NewBook {
    pub fn new(
        title: &str,
        author: &str,
        publication_year: i32,
        pages: i32,
        total_copies: i32,
    ) -> AppResult<Self> {
        let title = require_text(title, "Title cannot be empty.")?;
        let author = require_text(author, "Author cannot be empty.")?;
        if total_copies < 0 {
            return Err(AppError::Validation("Total copies cannot be negative.".to_string()));
        }
        check_pages(pages)?;

        Ok(Self {
            title,
            author,
            publication_year,
            pages,
            total_copies,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publication_year(&self) -> i32 {
        self.publication_year
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn total_copies(&self) -> i32 {
        self.total_copies
    }
}

impl TryFrom<&CreateBook> for NewBook {
    type Error = AppError;

    fn try_from(data: &CreateBook) -> AppResult<Self> {
        NewBook::new(
            &data.title,
            &data.author,
            data.publication_year,
            data.pages,
            data.total_copies,
        )
    }
}

fn check_pages(pages: i32) -> AppResult<()> {
    if pages < 0 {
        return Err(AppError::Validation("Page count cannot be negative.".to_string()));
    }
    Ok(())
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: String,
    /// Negative years are BCE
    pub publication_year: i32,
    #[validate(range(min = 0, message = "Page count cannot be negative"))]
    pub pages: i32,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: i32,
}

/// Update book request. Total copies cannot be changed after creation.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 0, message = "Page count cannot be negative"))]
    pub pages: Option<i32>,
}

/// Book as returned to callers, with its derived availability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub pages: i32,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl From<&Book> for BookDetails {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            publication_year: book.publication_year,
            pages: book.pages,
            total_copies: book.total_copies,
            available_copies: book.available_copies(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::borrower::NewBorrower;
    use chrono::Duration;

    fn book(total_copies: i32) -> Book {
        Book::from_new(1, NewBook::new("Title", "Author", 2000, 100, total_copies).unwrap())
    }

    fn borrower(id: i32, name: &str) -> Borrower {
        Borrower::from_new(id, NewBorrower::new(name, &format!("{name}@example.com")).unwrap())
    }

    #[test]
    fn test_new_book_rejects_blank_fields() {
        assert!(matches!(
            NewBook::new("  ", "Author", 2000, 10, 1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            NewBook::new("Title", "", 2000, 10, 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_new_book_rejects_negative_counts() {
        assert!(matches!(
            NewBook::new("Title", "Author", 2000, 10, -1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            NewBook::new("Title", "Author", 2000, -10, 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_copies_and_bce_year_are_valid() {
        let new = NewBook::new("Laws", "Plato", -348, 450, 0).unwrap();
        assert_eq!(new.publication_year(), -348);
        assert_eq!(new.total_copies(), 0);
    }

    #[test]
    fn test_borrow_copy_stages_loan() {
        let mut book = book(2);
        let now = Utc::now();
        let lending = book.borrow_copy(&borrower(7, "alice"), now).unwrap();

        assert_eq!(lending.book_id(), 1);
        assert_eq!(lending.borrower_id(), 7);
        assert_eq!(lending.borrowed_at(), now);
        assert_eq!(book.open_loans(), 1);
        assert_eq!(book.available_copies(), 1);
    }

    #[test]
    fn test_borrow_copy_fails_when_all_copies_out() {
        let mut book = book(1);
        let now = Utc::now();
        book.borrow_copy(&borrower(1, "alice"), now).unwrap();

        let err = book.borrow_copy(&borrower(2, "bob"), now).unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded(ref title) if title == "Title"));
        assert_eq!(book.open_loans(), 1);
    }

    #[test]
    fn test_book_without_copies_cannot_be_borrowed() {
        let mut book = book(0);
        assert!(book.borrow_copy(&borrower(1, "alice"), Utc::now()).is_err());
        assert_eq!(book.available_copies(), 0);
    }

    #[test]
    fn test_closed_loans_do_not_count_against_capacity() {
        let now = Utc::now();
        let mut returned = LendingActivity::from_new(10, &NewLending::new(1, 1, now - Duration::days(3)));
        returned.mark_returned(now).unwrap();
        let open = LendingActivity::from_new(11, &NewLending::new(1, 2, now));

        let mut book = book(2).with_loans(vec![returned, open]);
        assert_eq!(book.open_loans(), 1);
        assert!(book.borrow_copy(&borrower(3, "carol"), now).is_ok());
        assert!(book.borrow_copy(&borrower(4, "dave"), now).is_err());
    }

    #[test]
    fn test_apply_update_is_all_or_nothing() {
        let mut book = book(1);
        let update = UpdateBook {
            title: Some("New title".into()),
            author: Some(" ".into()),
            ..Default::default()
        };

        assert!(book.apply_update(&update).is_err());
        assert_eq!(book.title(), "Title");

        let update = UpdateBook {
            title: Some("New title".into()),
            pages: Some(250),
            ..Default::default()
        };
        book.apply_update(&update).unwrap();
        assert_eq!(book.title(), "New title");
        assert_eq!(book.author(), "Author");
        assert_eq!(book.pages(), 250);
        assert_eq!(book.total_copies(), 1);
    }

    #[test]
    fn test_details_report_availability() {
        let mut book = book(3);
        book.borrow_copy(&borrower(1, "alice"), Utc::now()).unwrap();
        let details = BookDetails::from(&book);
        assert_eq!(details.total_copies, 3);
        assert_eq!(details.available_copies, 2);
    }
}
