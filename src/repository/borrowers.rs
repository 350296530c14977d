//! Borrowers repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{conflict_on_unique, BorrowerRepository};
use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, NewBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowerRepository for BorrowersRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    async fn list(&self) -> AppResult<Vec<Borrower>> {
        let rows = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, borrower: &NewBorrower) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>(
            "INSERT INTO borrowers (name, email) VALUES ($1, $2) RETURNING *",
        )
        .bind(borrower.name())
        .bind(borrower.email())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Email {} is already registered", borrower.email())))
    }

    async fn update(&self, borrower: &Borrower) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>(
            "UPDATE borrowers SET name = $1, email = $2 WHERE id = $3 RETURNING *",
        )
        .bind(borrower.name())
        .bind(borrower.email())
        .bind(borrower.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Email {} is already registered", borrower.email())))?
        .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", borrower.id())))
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM borrowers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::Conflict(format!(
                    "Borrower {} has lending history and cannot be deleted",
                    id
                )),
                _ => e.into(),
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }
        Ok(())
    }
}
