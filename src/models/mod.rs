//! Data models for the lending domain

pub mod book;
pub mod borrower;
pub mod lending;
pub mod report;

// Re-export commonly used types
pub use book::{Book, BookDetails, NewBook};
pub use borrower::{Borrower, NewBorrower};
pub use lending::{LendingActivity, NewLending};
pub use report::{BookRanking, DateRange, TopBorrower};

use crate::error::{AppError, AppResult};

/// Reject empty or whitespace-only text
fn require_text(value: &str, message: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(value.to_string())
}
