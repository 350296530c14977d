//! Aggregation algorithms over lending history.
//!
//! These are the in-process forms of the ranking queries. The PostgreSQL
//! repository expresses the same rules in SQL; both order equal counts by
//! ascending id so the two backends return identical rankings.

use std::collections::{HashMap, HashSet};

use crate::models::{report::CompletedLoans, DateRange, LendingActivity};

/// Loans are clamped to at least one day in total before dividing
const MIN_TOTAL_DAYS: f64 = 1.0;

/// `(id, count)` pairs, count descending then id ascending, at most `limit`
fn rank(counts: HashMap<i32, i64>, limit: usize) -> Vec<(i32, i64)> {
    let mut ranked: Vec<(i32, i64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Books by total number of loans, open and closed
pub fn most_borrowed(loans: &[LendingActivity], limit: usize) -> Vec<(i32, i64)> {
    let mut counts = HashMap::new();
    for loan in loans {
        *counts.entry(loan.book_id()).or_insert(0) += 1;
    }
    rank(counts, limit)
}

/// Other books read by the readers of `book_id`, ranked by how many distinct
/// readers they share. Repeat loans by the same reader count once.
pub fn also_borrowed(loans: &[LendingActivity], book_id: i32, limit: usize) -> Vec<(i32, i64)> {
    let readers: HashSet<i32> = loans
        .iter()
        .filter(|l| l.book_id() == book_id)
        .map(|l| l.borrower_id())
        .collect();
    if readers.is_empty() {
        return Vec::new();
    }

    let mut shared: HashMap<i32, HashSet<i32>> = HashMap::new();
    for loan in loans {
        if loan.book_id() != book_id && readers.contains(&loan.borrower_id()) {
            shared.entry(loan.book_id()).or_default().insert(loan.borrower_id());
        }
    }

    let counts = shared
        .into_iter()
        .map(|(book, borrowers)| (book, borrowers.len() as i64))
        .collect();
    rank(counts, limit)
}

/// Borrowers by number of loans started inside `range`
pub fn top_borrowers(loans: &[LendingActivity], range: &DateRange, limit: usize) -> Vec<(i32, i64)> {
    let mut counts = HashMap::new();
    for loan in loans.iter().filter(|l| range.contains(l.borrowed_at())) {
        *counts.entry(loan.borrower_id()).or_insert(0) += 1;
    }
    rank(counts, limit)
}

/// Count and total duration of the closed loans in `loans`
pub fn completed_loans<'a>(loans: impl IntoIterator<Item = &'a LendingActivity>) -> CompletedLoans {
    loans
        .into_iter()
        .filter_map(LendingActivity::duration_days)
        .fold(CompletedLoans::default(), |acc, days| CompletedLoans {
            count: acc.count + 1,
            total_days: acc.total_days + days,
        })
}

/// Aggregate pages read per day across a book's completed loans.
///
/// This approximates throughput over the whole loan history, not any single
/// reader's pace.
pub fn reading_rate(pages: i32, completed: CompletedLoans) -> f64 {
    if completed.count == 0 {
        return 0.0;
    }
    let total_days = completed.total_days.max(MIN_TOTAL_DAYS);
    (completed.count as f64 * pages as f64) / total_days
}
