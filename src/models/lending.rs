//! Lending activity (loan) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookDetails;
use crate::error::{AppError, AppResult};

/// One loan of one copy of a book to one borrower.
///
/// References its book and borrower by id only. Closed at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct LendingActivity {
    id: i32,
    book_id: i32,
    borrower_id: i32,
    borrowed_at: DateTime<Utc>,
    /// Absent while the loan is open
    returned_at: Option<DateTime<Utc>>,
}

impl LendingActivity {
    pub(crate) fn from_new(id: i32, new: &NewLending) -> Self {
        Self {
            id,
            book_id: new.book_id,
            borrower_id: new.borrower_id,
            borrowed_at: new.borrowed_at,
            returned_at: None,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn book_id(&self) -> i32 {
        self.book_id
    }

    pub fn borrower_id(&self) -> i32 {
        self.borrower_id
    }

    pub fn borrowed_at(&self) -> DateTime<Utc> {
        self.borrowed_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Loan length in fractional days, for closed loans only
    pub fn duration_days(&self) -> Option<f64> {
        self.returned_at
            .map(|returned| (returned - self.borrowed_at).num_milliseconds() as f64 / 86_400_000.0)
    }

    /// Close the loan. A returned loan keeps its original return timestamp.
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.returned_at.is_some() {
            return Err(AppError::AlreadyReturned(self.id));
        }
        self.returned_at = Some(now);
        Ok(())
    }
}

/// A loan produced by a successful borrow, waiting to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLending {
    book_id: i32,
    borrower_id: i32,
    borrowed_at: DateTime<Utc>,
}

impl NewLending {
    pub(super) fn new(book_id: i32, borrower_id: i32, borrowed_at: DateTime<Utc>) -> Self {
        Self {
            book_id,
            borrower_id,
            borrowed_at,
        }
    }

    pub fn book_id(&self) -> i32 {
        self.book_id
    }

    pub fn borrower_id(&self) -> i32 {
        self.borrower_id
    }

    pub fn borrowed_at(&self) -> DateTime<Utc> {
        self.borrowed_at
    }
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLending {
    pub book_id: i32,
    pub borrower_id: i32,
}

/// A borrower's loan together with the borrowed book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LendingHistoryEntry {
    pub lending_id: i32,
    pub book: BookDetails,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}
