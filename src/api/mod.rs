//! API handlers for the lending REST endpoints

pub mod books;
pub mod borrowers;
pub mod health;
pub mod lendings;
pub mod openapi;

use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{IntoParams, ToSchema};

use crate::{services::reports::DEFAULT_REPORT_SIZE, AppState};

pub(crate) const DEFAULT_COUNT: i64 = DEFAULT_REPORT_SIZE;

/// Size of a ranked report
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CountQuery {
    /// Number of entries to return (default: 5, must be positive)
    pub count: Option<i64>,
}

impl CountQuery {
    fn count(&self) -> i64 {
        self.count.unwrap_or(DEFAULT_COUNT)
    }
}

/// Inclusive date window (RFC 3339 timestamps)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Date window plus report size
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MostActiveQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Number of borrowers to return (default: 5, must be positive)
    pub count: Option<i64>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/most-borrowed", get(books::most_borrowed))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/availability", get(books::get_availability))
        .route("/books/:id/also-borrowed", get(books::also_borrowed))
        .route("/books/:id/reading-rate", get(books::reading_rate))
        // Borrowers
        .route("/borrowers", get(borrowers::list_borrowers).post(borrowers::create_borrower))
        .route("/borrowers/most-active", get(borrowers::most_active))
        .route(
            "/borrowers/:id",
            get(borrowers::get_borrower)
                .put(borrowers::update_borrower)
                .delete(borrowers::delete_borrower),
        )
        .route("/borrowers/:id/history", get(borrowers::get_history))
        // Lendings
        .route("/lendings", post(lendings::create_lending))
        .route("/lendings/:id", get(lendings::get_lending))
        .route("/lendings/:id/return", put(lendings::return_lending))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        config::AppConfig,
        repository::Repository,
        services::Services,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let state = AppState {
            config: Arc::new(AppConfig::default()),
            services: Arc::new(Services::new(Repository::in_memory(), Arc::new(clock))),
        };
        create_router(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_borrow_and_return_flow() {
        let app = app();
        let (status, book) = call(
            &app,
            Method::POST,
            "/api/v1/books",
            Some(json!({
                "title": "Laws",
                "author": "Plato",
                "publication_year": -348,
                "pages": 450,
                "total_copies": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(book["available_copies"], 1);

        let (_, alice) = call(
            &app,
            Method::POST,
            "/api/v1/borrowers",
            Some(json!({"name": "Alice", "email": "alice@example.com"})),
        )
        .await;
        let (_, bob) = call(
            &app,
            Method::POST,
            "/api/v1/borrowers",
            Some(json!({"name": "Bob", "email": "bob@example.com"})),
        )
        .await;

        let (status, lending) = call(
            &app,
            Method::POST,
            "/api/v1/lendings",
            Some(json!({"book_id": book["id"], "borrower_id": alice["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(lending["returned_at"].is_null());

        let (status, err) = call(
            &app,
            Method::POST,
            "/api/v1/lendings",
            Some(json!({"book_id": book["id"], "borrower_id": bob["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "NoCopyAvailable");

        let uri = format!("/api/v1/lendings/{}/return", lending["id"]);
        let (status, returned) = call(&app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(returned["returned_at"].is_string());

        let (status, _) = call(&app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, ranking) = call(&app, Method::GET, "/api/v1/books/most-borrowed?count=3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ranking[0]["borrow_count"], 1);

        let uri = format!("/api/v1/books/{}", book["id"]);
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/v1/books/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/api/v1/books/most-borrowed?count=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/v1/borrowers/most-active?start_date=2024-02-01T00:00:00Z&end_date=2024-01-01T00:00:00Z",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/borrowers",
            Some(json!({"name": "Nobody", "email": "not-an-email"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
