//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::lending::{CreateLending, LendingActivity},
    AppState,
};

/// Borrow a copy of a book
#[utoipa::path(
    post,
    path = "/lendings",
    tag = "lendings",
    request_body = CreateLending,
    responses(
        (status = 201, description = "Loan recorded", body = LendingActivity),
        (status = 400, description = "No copy available", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_lending(
    State(state): State<AppState>,
    Json(request): Json<CreateLending>,
) -> AppResult<(StatusCode, Json<LendingActivity>)> {
    let lending = state
        .services
        .ledger
        .borrow(request.book_id, request.borrower_id)
        .await?;

    tracing::info!(
        lending_id = lending.id(),
        book_id = lending.book_id(),
        borrower_id = lending.borrower_id(),
        "Book borrowed"
    );
    Ok((StatusCode::CREATED, Json(lending)))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/lendings/{id}",
    tag = "lendings",
    params(("id" = i32, Path, description = "Lending ID")),
    responses(
        (status = 200, description = "Loan", body = LendingActivity),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_lending(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LendingActivity>> {
    let lending = state.services.ledger.get_lending(id).await?;
    Ok(Json(lending))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/lendings/{id}/return",
    tag = "lendings",
    params(("id" = i32, Path, description = "Lending ID")),
    responses(
        (status = 200, description = "Loan closed", body = LendingActivity),
        (status = 400, description = "Already returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_lending(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LendingActivity>> {
    let lending = state.services.ledger.return_loan(id).await?;

    tracing::info!(lending_id = id, book_id = lending.book_id(), "Book returned");
    Ok(Json(lending))
}
