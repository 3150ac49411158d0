//! API integration tests
//!
//! Need a running server with the bootstrap admin configured as
//! `admin` / `admin`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["access_token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

/// Register a fresh reader and return its token
async fn new_reader(client: &Client) -> String {
    let username = format!("reader{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "secret"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    login(client, &username, "secret").await
}

/// Create a book with the given number of copies, returns its id
async fn create_book(client: &Client, admin: &str, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "title": "Integration Test Book",
            "available_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book id")
}

async fn book_copies(client: &Client, token: &str, book_id: i64) -> i64 {
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["available_copies"].as_i64().expect("No copy count")
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
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
#[ignore]
async fn test_single_copy_lifecycle() {
    let client = Client::new();
    let admin = login(&client, "admin", "admin").await;
    let reader = new_reader(&client).await;
    let book_id = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/borrow/{}", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert!(loan["actual_return_date"].is_null());
    assert_eq!(book_copies(&client, &reader, book_id).await, 0);

    let response = client
        .post(format!("{}/loans/borrow/{}", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/loans/return/{}", BASE_URL, loan["loan_id"]))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(book_copies(&client, &reader, book_id).await, 1);

    // Closed loan removal still credits a copy
    let response = client
        .delete(format!("{}/loans/remove/{}", BASE_URL, loan["loan_id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(book_copies(&client, &reader, book_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_never_oversell() {
    let client = Client::new();
    let admin = login(&client, "admin", "admin").await;
    let book_id = create_book(&client, &admin, 2).await;

    let mut readers = Vec::new();
    for _ in 0..6 {
        readers.push(new_reader(&client).await);
    }

    let mut handles = Vec::new();
    for reader in readers.clone() {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/loans/borrow/{}", BASE_URL, book_id))
                .bearer_auth(reader)
                .send()
                .await
                .expect("Failed to send request")
                .status()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.expect("task panicked") == StatusCode::CREATED {
            granted += 1;
        }
    }

    assert_eq!(granted, 2);
    assert_eq!(book_copies(&client, &readers[0], book_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_book_with_open_loan_cannot_be_deleted() {
    let client = Client::new();
    let admin = login(&client, "admin", "admin").await;
    let reader = new_reader(&client).await;
    let book_id = create_book(&client, &admin, 1).await;

    client
        .post(format!("{}/loans/borrow/{}", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
