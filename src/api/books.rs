//! Book catalog and book report endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::CountQuery;
use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, CreateBook, UpdateBook},
        report::{BookAvailability, BookRanking, ReadingRate},
    },
    AppState,
};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books with availability", body = Vec<BookDetails>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookDetails>>> {
    let books = state.services.catalog.list().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_by_id(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    book.validate()?;

    let created = state.services.catalog.create(&book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a book's descriptive fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<BookDetails>> {
    book.validate()?;

    let updated = state.services.catalog.update(id, &book).await?;
    Ok(Json(updated))
}

/// Delete a book that was never lent
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book has lending history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Copies available and on loan
#[utoipa::path(
    get,
    path = "/books/{id}/availability",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Availability", body = BookAvailability),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookAvailability>> {
    let availability = state.services.catalog.availability(id).await?;
    Ok(Json(availability))
}

/// Most borrowed books of all time
#[utoipa::path(
    get,
    path = "/books/most-borrowed",
    tag = "reports",
    params(CountQuery),
    responses(
        (status = 200, description = "Books by loan count, highest first", body = Vec<BookRanking>),
        (status = 400, description = "Invalid count", body = crate::error::ErrorResponse)
    )
)]
pub async fn most_borrowed(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<Vec<BookRanking>>> {
    let ranking = state.services.reports.most_borrowed(query.count()).await?;
    Ok(Json(ranking))
}

/// Other books read by this book's borrowers
#[utoipa::path(
    get,
    path = "/books/{id}/also-borrowed",
    tag = "reports",
    params(("id" = i32, Path, description = "Book ID"), CountQuery),
    responses(
        (status = 200, description = "Books by number of shared readers", body = Vec<BookRanking>),
        (status = 400, description = "Invalid count", body = crate::error::ErrorResponse)
    )
)]
pub async fn also_borrowed(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<Vec<BookRanking>>> {
    let ranking = state.services.reports.also_borrowed(id, query.count()).await?;
    Ok(Json(ranking))
}

/// Average reading rate over completed loans
#[utoipa::path(
    get,
    path = "/books/{id}/reading-rate",
    tag = "reports",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Pages per day", body = ReadingRate),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reading_rate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReadingRate>> {
    let rate = state.services.reports.reading_rate(id).await?;
    Ok(Json(rate))
}
