//! Borrower endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{DateRangeQuery, MostActiveQuery};
use crate::{
    error::AppResult,
    models::{
        borrower::{Borrower, CreateBorrower, UpdateBorrower},
        lending::LendingHistoryEntry,
        report::TopBorrower,
    },
    AppState,
};

/// List all borrowers
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    responses(
        (status = 200, description = "All borrowers", body = Vec<Borrower>)
    )
)]
pub async fn list_borrowers(State(state): State<AppState>) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.borrowers.list().await?;
    Ok(Json(borrowers))
}

/// Get borrower by ID
#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower", body = Borrower),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_borrower(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get_by_id(id).await?;
    Ok(Json(borrower))
}

/// Register a borrower
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_borrower(
    State(state): State<AppState>,
    Json(borrower): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    borrower.validate()?;

    let created = state.services.borrowers.create(&borrower).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a borrower
#[utoipa::path(
    put,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_borrower(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(borrower): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    borrower.validate()?;

    let updated = state.services.borrowers.update(id, &borrower).await?;
    Ok(Json(updated))
}

/// Delete a borrower with no lending history
#[utoipa::path(
    delete,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Borrower has lending history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_borrower(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.borrowers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Borrowers with the most loans in a date window
#[utoipa::path(
    get,
    path = "/borrowers/most-active",
    tag = "reports",
    params(MostActiveQuery),
    responses(
        (status = 200, description = "Borrowers by loan count, highest first", body = Vec<TopBorrower>),
        (status = 400, description = "Invalid range or count", body = crate::error::ErrorResponse)
    )
)]
pub async fn most_active(
    State(state): State<AppState>,
    Query(query): Query<MostActiveQuery>,
) -> AppResult<Json<Vec<TopBorrower>>> {
    let count = query.count.unwrap_or(super::DEFAULT_COUNT);
    let top = state
        .services
        .reports
        .top_borrowers(query.start_date, query.end_date, count)
        .await?;
    Ok(Json(top))
}

/// A borrower's loans in a date window, newest first
#[utoipa::path(
    get,
    path = "/borrowers/{id}/history",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Borrowing history", body = Vec<LendingHistoryEntry>),
        (status = 400, description = "Invalid range", body = crate::error::ErrorResponse),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<LendingHistoryEntry>>> {
    let history = state
        .services
        .borrowers
        .history(id, query.start_date, query.end_date)
        .await?;
    Ok(Json(history))
}
