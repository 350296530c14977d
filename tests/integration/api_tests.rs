//! API integration tests
//!
//! Require a running server with an empty store:
//! `LENDING_DATABASE__BACKEND=memory cargo run`, then `cargo test -- --ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique suffix so repeated runs do not collide on borrower emails
fn unique() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos()
}

async fn create_book(client: &Client, title: &str, copies: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": title,
            "author": "Plato",
            "publication_year": -370,
            "pages": 200,
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse book")
}

async fn create_borrower(client: &Client, name: &str) -> Value {
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}.{}@example.com", name.to_lowercase(), unique())
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse borrower")
}

async fn borrow(client: &Client, book: &Value, borrower: &Value) -> reqwest::Response {
    client
        .post(format!("{}/lendings", BASE_URL))
        .json(&json!({ "book_id": book["id"], "borrower_id": borrower["id"] }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_single_copy_can_only_be_lent_once() {
    let client = Client::new();
    let book = create_book(&client, "Phaedo", 1).await;
    let alice = create_borrower(&client, "Alice").await;
    let bob = create_borrower(&client, "Bob").await;

    let response = borrow(&client, &book, &alice).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let lending: Value = response.json().await.expect("Failed to parse lending");

    let response = borrow(&client, &book, &bob).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/lendings/{}/return", BASE_URL, lending["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = borrow(&client, &book, &bob).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore]
async fn test_availability_tracks_open_loans() {
    let client = Client::new();
    let book = create_book(&client, "Theaetetus", 2).await;
    let reader = create_borrower(&client, "Reader").await;

    assert_eq!(borrow(&client, &book, &reader).await.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/books/{}/availability", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["borrowed_copies"], 1);
    assert_eq!(body["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_reports_reject_bad_input() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/most-borrowed?count=0", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!(
            "{}/borrowers/most-active?start_date=2024-03-01T00:00:00Z&end_date=2024-03-01T00:00:00Z",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/books/999999/reading-rate", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
