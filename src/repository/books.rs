//! Books repository for database operations

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::BookRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, NewBook},
        lending::LendingActivity,
        report::BookRanking,
    },
};

/// Book columns plus derived availability, aliased for `BookDetails`
pub(crate) const BOOK_DETAILS_COLUMNS: &str = r#"
    b.id, b.title, b.author, b.publication_year, b.pages, b.total_copies,
    (b.total_copies - (
        SELECT COUNT(*) FROM lending_activities o
        WHERE o.book_id = b.id AND o.returned_at IS NULL
    ))::int AS available_copies
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn open_loans_for(&self, book_id: i32) -> AppResult<Vec<LendingActivity>> {
        let loans = sqlx::query_as::<_, LendingActivity>(
            "SELECT * FROM lending_activities WHERE book_id = $1 AND returned_at IS NULL ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }
}

#[async_trait]
impl BookRepository for BooksRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let loans = self.open_loans_for(id).await?;
        Ok(book.with_loans(loans))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let open = sqlx::query_as::<_, LendingActivity>(
            "SELECT * FROM lending_activities WHERE returned_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i32, Vec<LendingActivity>> = HashMap::new();
        for loan in open {
            by_book.entry(loan.book_id()).or_default().push(loan);
        }

        Ok(books
            .into_iter()
            .map(|book| {
                let loans = by_book.remove(&book.id()).unwrap_or_default();
                book.with_loans(loans)
            })
            .collect())
    }

    async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, publication_year, pages, total_copies)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book.title())
        .bind(book.author())
        .bind(book.publication_year())
        .bind(book.pages())
        .bind(book.total_copies())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, publication_year = $3, pages = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(book.title())
        .bind(book.author())
        .bind(book.publication_year())
        .bind(book.pages())
        .bind(book.id())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book.id())))?;

        self.get_by_id(book.id()).await
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::Conflict(format!("Book {} has lending history and cannot be deleted", id))
                }
                _ => e.into(),
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn most_borrowed(&self, count: i64) -> AppResult<Vec<BookRanking>> {
        let query = format!(
            r#"
            SELECT {BOOK_DETAILS_COLUMNS}, COUNT(l.id) AS borrow_count
            FROM books b
            JOIN lending_activities l ON l.book_id = b.id
            GROUP BY b.id
            ORDER BY borrow_count DESC, b.id ASC
            LIMIT $1
            "#
        );
        let rows = sqlx::query_as::<_, BookRanking>(&query)
            .bind(count)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn also_borrowed(&self, book_id: i32, count: i64) -> AppResult<Vec<BookRanking>> {
        // Distinct borrowers per other book, not raw loan counts
        let query = format!(
            r#"
            WITH readers AS (
                SELECT DISTINCT borrower_id FROM lending_activities WHERE book_id = $1
            )
            SELECT {BOOK_DETAILS_COLUMNS}, COUNT(DISTINCT l.borrower_id) AS borrow_count
            FROM lending_activities l
            JOIN readers r ON r.borrower_id = l.borrower_id
            JOIN books b ON b.id = l.book_id
            WHERE l.book_id <> $1
            GROUP BY b.id
            ORDER BY borrow_count DESC, b.id ASC
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, BookRanking>(&query)
            .bind(book_id)
            .bind(count)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
