//! Lending analytics service

use chrono::{DateTime, Utc};

use crate::{
    analytics,
    error::{AppError, AppResult},
    models::report::{BookRanking, DateRange, ReadingRate, TopBorrower},
    repository::Repository,
};

/// Default size of ranked reports when the caller does not ask for one
pub const DEFAULT_REPORT_SIZE: i64 = 5;

fn check_count(count: i64) -> AppResult<i64> {
    if count <= 0 {
        return Err(AppError::Validation("Count must be a positive number.".to_string()));
    }
    Ok(count)
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Books ranked by total loans, ties by ascending book id
    pub async fn most_borrowed(&self, count: i64) -> AppResult<Vec<BookRanking>> {
        let count = check_count(count)?;
        self.repository.books.most_borrowed(count).await
    }

    /// Books read by the readers of `book_id`, ranked by distinct shared readers
    pub async fn also_borrowed(&self, book_id: i32, count: i64) -> AppResult<Vec<BookRanking>> {
        let count = check_count(count)?;
        self.repository.books.also_borrowed(book_id, count).await
    }

    /// Borrowers with the most loans started in `[start, end]`
    pub async fn top_borrowers(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        count: i64,
    ) -> AppResult<Vec<TopBorrower>> {
        let range = DateRange::new(start, end)?;
        let count = check_count(count)?;
        self.repository.lendings.top_borrowers(range, count).await
    }

    pub async fn reading_rate(&self, book_id: i32) -> AppResult<ReadingRate> {
        let book = self.repository.books.get_by_id(book_id).await?;
        let completed = self.repository.lendings.completed_loans(book_id).await?;

        Ok(ReadingRate {
            book_id,
            completed_loans: completed.count,
            pages_per_day: analytics::reading_rate(book.pages(), completed),
        })
    }
}
