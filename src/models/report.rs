//! Read models produced by the analytics queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookDetails;
use crate::error::{AppError, AppResult};

/// A book and the number of loans (or distinct co-borrowers) it ranked by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookRanking {
    #[sqlx(flatten)]
    pub book: BookDetails,
    pub borrow_count: i64,
}

/// Borrower activity over a date window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TopBorrower {
    pub borrower_id: i32,
    pub name: String,
    pub borrow_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookAvailability {
    pub book_id: i32,
    pub total_copies: i32,
    pub borrowed_copies: i32,
    pub available_copies: i32,
}

/// Aggregate over a book's completed loans
#[derive(Debug, Clone, Copy, PartialEq, Default, FromRow)]
pub struct CompletedLoans {
    pub count: i64,
    /// Sum of loan durations in fractional days
    pub total_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReadingRate {
    pub book_id: i32,
    pub completed_loans: i64,
    pub pages_per_day: f64,
}

/// Inclusive time window, start strictly before end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidRange(format!(
                "start date {} must be before end date {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_range_requires_start_before_end() {
        let now = Utc::now();
        assert!(matches!(DateRange::new(now, now), Err(AppError::InvalidRange(_))));
        assert!(matches!(
            DateRange::new(now, now - Duration::days(1)),
            Err(AppError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let start = Utc::now();
        let end = start + Duration::days(7);
        let range = DateRange::new(start, end).unwrap();
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + Duration::seconds(1)));
    }
}
