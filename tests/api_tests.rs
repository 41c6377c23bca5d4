//! API integration tests
//!
//! These run against a live server with a clean database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique-ish matricula per test run to avoid registration conflicts
fn matricula(seed: u32) -> String {
    let pid = std::process::id() % 10_000;
    format!("{:04}{:04}", pid, seed % 10_000)
}

async fn register_student(client: &Client, seed: u32) -> Value {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test Student",
            "role": "student",
            "matricula": matricula(seed)
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse register response")
}

async fn create_book(client: &Client) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Pedro Páramo",
            "author": "Juan Rulfo",
            "description": "Un hombre busca a su padre en Comala."
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse book response")
}

/// Create a loan request for a fresh student and book, returning
/// (loan, ticket, book id)
async fn create_loan(client: &Client, seed: u32) -> (Value, String, String) {
    let student = register_student(client, seed).await;
    let book = create_book(client).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book["id"],
            "student_id": student["id"],
            "pickup_date": "2030-06-01",
            "return_date": "2030-06-15"
        }))
        .send()
        .await
        .expect("Failed to send create loan request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse loan response");

    let ticket = body["ticket"].as_str().expect("No ticket in response").to_string();
    let book_id = book["id"].as_str().expect("No book id").to_string();
    (body["loan"].clone(), ticket, book_id)
}

async fn get_book_by_id(client: &Client, book_id: &str) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send get book request");

    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse book response")
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login_student() {
    let client = Client::new();
    let m = matricula(42);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Ana Torres",
            "role": "student",
            "matricula": m
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": m }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "Ana Torres");
    assert_eq!(body["role"], "student");
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_bad_matricula() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Ana Torres",
            "role": "student",
            "matricula": "1234"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_matricula_conflicts() {
    let client = Client::new();

    register_student(&client, 77).await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Someone Else",
            "role": "student",
            "matricula": matricula(77)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_register_admin_requires_shared_key() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Rogue Admin",
            "role": "admin",
            "admin_key": "wrong-key"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": format!("Admin {}", matricula(13)),
            "role": "admin",
            "admin_key": "BIBLIO-KEY-2024"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle_happy_path() {
    let client = Client::new();
    let (loan, _ticket, book_id) = create_loan(&client, 100).await;
    let loan_id = loan["id"].as_str().expect("No loan id");

    assert_eq!(loan["status"], "PENDING");
    assert!(!get_book_by_id(&client, &book_id).await["available"].as_bool().unwrap());

    // Approve pickup
    let response = client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send approve request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "ACTIVE");

    // Book still held while active
    assert!(!get_book_by_id(&client, &book_id).await["available"].as_bool().unwrap());

    // Return
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "RETURNED");

    // Returning frees the book
    assert!(get_book_by_id(&client, &book_id).await["available"].as_bool().unwrap());
}

#[tokio::test]
#[ignore]
async fn test_unavailable_book_cannot_be_requested() {
    let client = Client::new();
    let (_loan, _ticket, book_id) = create_loan(&client, 200).await;
    let student = register_student(&client, 201).await;

    // Book is now held by the first request
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book_id,
            "student_id": student["id"],
            "pickup_date": "2030-06-01",
            "return_date": "2030-06-15"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_loan_rejects_bad_dates() {
    let client = Client::new();
    let student = register_student(&client, 250).await;
    let book = create_book(&client).await;

    // Pickup after return
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book["id"],
            "student_id": student["id"],
            "pickup_date": "2030-06-15",
            "return_date": "2030-06-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Dates in the past
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book["id"],
            "student_id": student["id"],
            "pickup_date": "2020-06-01",
            "return_date": "2020-06-15"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Neither attempt claimed the book
    assert!(get_book_by_id(&client, book["id"].as_str().unwrap()).await["available"]
        .as_bool()
        .unwrap());
}

#[tokio::test]
#[ignore]
async fn test_invalid_transitions_are_rejected() {
    let client = Client::new();
    let (loan, _ticket, _book_id) = create_loan(&client, 300).await;
    let loan_id = loan["id"].as_str().expect("No loan id");

    // Overdue on a pending loan
    let response = client
        .post(format!("{}/loans/{}/overdue", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Approve twice
    let response = client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return, then return again on the terminal state
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_overdue_then_return_releases_book() {
    let client = Client::new();
    let (loan, _ticket, book_id) = create_loan(&client, 400).await;
    let loan_id = loan["id"].as_str().expect("No loan id");

    client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send approve request");

    // Marking overdue releases the copy for other borrowers
    let response = client
        .post(format!("{}/loans/{}/overdue", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send overdue request");
    assert!(response.status().is_success());
    assert!(get_book_by_id(&client, &book_id).await["available"].as_bool().unwrap());

    // OVERDUE -> RETURNED still works
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "RETURNED");
}

#[tokio::test]
#[ignore]
async fn test_scan_ticket_round_trip() {
    let client = Client::new();
    let (loan, ticket, _book_id) = create_loan(&client, 500).await;

    let response = client
        .post(format!("{}/loans/scan", BASE_URL))
        .json(&json!({ "payload": ticket }))
        .send()
        .await
        .expect("Failed to send scan request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse scan response");
    assert_eq!(body["id"], loan["id"]);
    assert_eq!(body["student_matricula"], loan["student_matricula"]);
    assert_eq!(body["book_title"], loan["book_title"]);
}

#[tokio::test]
#[ignore]
async fn test_scan_rejects_malformed_payload() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans/scan", BASE_URL))
        .json(&json!({ "payload": "{\"id\": \"123\"}" }))
        .send()
        .await
        .expect("Failed to send scan request");

    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/loans/scan", BASE_URL))
        .json(&json!({ "payload": "not json" }))
        .send()
        .await
        .expect("Failed to send scan request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_stats_shape() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    for key in [
        "books_total",
        "books_available",
        "loans_pending",
        "loans_active",
        "loans_overdue",
        "loans_due_soon",
    ] {
        assert!(body[key].is_number(), "missing stat {}", key);
    }
}
