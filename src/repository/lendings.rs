//! Lending activities repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, Transaction};

use super::{books::BOOK_DETAILS_COLUMNS, LedgerTransaction, LendingRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails},
        borrower::Borrower,
        lending::{LendingActivity, LendingHistoryEntry, NewLending},
        report::{CompletedLoans, DateRange, TopBorrower},
    },
};

#[derive(Clone)]
pub struct LendingsRepository {
    pool: Pool<Postgres>,
}

impl LendingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct HistoryRow {
    lending_id: i32,
    borrowed_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    book: BookDetails,
}

impl From<HistoryRow> for LendingHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            lending_id: row.lending_id,
            book: row.book,
            borrowed_at: row.borrowed_at,
            returned_at: row.returned_at,
        }
    }
}

#[async_trait]
impl LendingRepository for LendingsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<LendingActivity> {
        sqlx::query_as::<_, LendingActivity>("SELECT * FROM lending_activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lending activity {} not found", id)))
    }

    async fn count_open_for_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lending_activities WHERE book_id = $1 AND returned_at IS NULL",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn history_for_borrower(
        &self,
        borrower_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<LendingHistoryEntry>> {
        let query = format!(
            r#"
            SELECT l.id AS lending_id, l.borrowed_at, l.returned_at, {BOOK_DETAILS_COLUMNS}
            FROM lending_activities l
            JOIN books b ON b.id = l.book_id
            WHERE l.borrower_id = $1 AND l.borrowed_at >= $2 AND l.borrowed_at <= $3
            ORDER BY l.borrowed_at DESC, l.id DESC
            "#
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&query)
            .bind(borrower_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_borrowers(&self, range: DateRange, count: i64) -> AppResult<Vec<TopBorrower>> {
        let rows = sqlx::query_as::<_, TopBorrower>(
            r#"
            SELECT br.id AS borrower_id, br.name, COUNT(*) AS borrow_count
            FROM lending_activities l
            JOIN borrowers br ON br.id = l.borrower_id
            WHERE l.borrowed_at >= $1 AND l.borrowed_at <= $2
            GROUP BY br.id
            ORDER BY borrow_count DESC, br.id ASC
            LIMIT $3
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .bind(count)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn completed_loans(&self, book_id: i32) -> AppResult<CompletedLoans> {
        let summary = sqlx::query_as::<_, CompletedLoans>(
            r#"
            SELECT COUNT(*) AS count,
                   COALESCE(SUM(EXTRACT(EPOCH FROM (returned_at - borrowed_at)) / 86400.0), 0)::float8 AS total_days
            FROM lending_activities
            WHERE book_id = $1 AND returned_at IS NOT NULL
            "#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }
}

/// Ledger unit of work over a database transaction; rolled back on drop
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let loans = sqlx::query_as::<_, LendingActivity>(
            "SELECT * FROM lending_activities WHERE book_id = $1 AND returned_at IS NULL ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(book.with_loans(loans))
    }

    async fn find_borrower(&mut self, borrower_id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(borrower_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", borrower_id)))
    }

    async fn find_lending(&mut self, lending_id: i32) -> AppResult<LendingActivity> {
        sqlx::query_as::<_, LendingActivity>(
            "SELECT * FROM lending_activities WHERE id = $1 FOR UPDATE",
        )
        .bind(lending_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lending activity {} not found", lending_id)))
    }

    async fn insert_lending(&mut self, lending: &NewLending) -> AppResult<LendingActivity> {
        let row = sqlx::query_as::<_, LendingActivity>(
            r#"
            INSERT INTO lending_activities (book_id, borrower_id, borrowed_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(lending.book_id())
        .bind(lending.borrower_id())
        .bind(lending.borrowed_at())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_lending(&mut self, lending: &LendingActivity) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE lending_activities SET returned_at = $1 WHERE id = $2 AND returned_at IS NULL",
        )
        .bind(lending.returned_at())
        .bind(lending.id())
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyReturned(lending.id()));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
