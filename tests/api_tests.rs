//! API integration tests
//!
//! These run against a live server (and database). Start one locally, then:
//! cargo test -- --ignored

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::{json, Value};

use booknest_server::models::user::{Role, UserClaims};

const BASE_URL: &str = "http://localhost:8080";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

fn token_for(user_id: i32, email: &str, role: Role) -> String {
    let claims = UserClaims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .expect("Failed to sign test token")
}

fn staff_token() -> String {
    token_for(1, "staff@booknest.test", Role::Staff)
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@booknest.test", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap())
}

/// Create a verified member and return (id, email)
async fn create_verified_member(client: &Client, token: &str) -> (i64, String) {
    let email = unique_email("member");
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Test Member", "email": email }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse user");
    let id = body["id"].as_i64().expect("No user ID");

    let response = client
        .put(format!("{}/users/{}/kyc", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "kyc_status": "verified" }))
        .send()
        .await
        .expect("Failed to set KYC status");
    assert!(response.status().is_success());

    (id, email)
}

/// Create a book with the given number of copies and return its id
async fn create_book(client: &Client, token: &str, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/book", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": format!("Test Book {}", chrono::Utc::now().timestamp_nanos_opt().unwrap()),
            "author": "Test Author",
            "price": "12.50",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse book");
    body["id"].as_i64().expect("No book ID")
}

async fn get_book(client: &Client, token: &str, book_id: i64) -> Value {
    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to get book");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse book")
}

#[tokio::test]
#[ignore]
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
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/book", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_decrements_quantity_and_return_restores_it() {
    let client = Client::new();
    let token = staff_token();

    let book_id = create_book(&client, &token, 2).await;
    let (_, email) = create_verified_member(&client, &token).await;

    // Borrow
    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to record borrow");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse borrow");
    assert_eq!(body["success"], true);
    let loan_id = body["loan_id"].as_i64().expect("No loan ID");

    let book = get_book(&client, &token, book_id).await;
    assert_eq!(book["quantity"], 1);
    assert_eq!(book["total_copies"], 2);

    // Same member borrowing again is a conflict
    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return (staff may return on behalf of the borrower)
    let response = client
        .put(format!("{}/borrow/return-borrowed-book/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to return");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse return");
    // Returned within the loan period: no fine
    assert_eq!(body["fine"], "0.00");

    let book = get_book(&client, &token, book_id).await;
    assert_eq!(book["quantity"], 2);

    // Second return of the same loan is a conflict and changes nothing
    let response = client
        .put(format!("{}/borrow/return-borrowed-book/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let book = get_book(&client, &token, book_id).await;
    assert_eq!(book["quantity"], 2);
}

#[tokio::test]
#[ignore]
async fn test_borrow_unverified_member_is_forbidden() {
    let client = Client::new();
    let token = staff_token();

    let book_id = create_book(&client, &token, 1).await;

    let email = unique_email("unverified");
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Unverified", "email": email }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let token = staff_token();

    let book_id = create_book(&client, &token, 1).await;

    let mut emails = Vec::new();
    for _ in 0..5 {
        let (_, email) = create_verified_member(&client, &token).await;
        emails.push(email);
    }

    let mut handles = Vec::new();
    for email in &emails {
        let client = client.clone();
        let token = token.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "email": email }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("Borrow task panicked"));
    }

    let successes = statuses.iter().filter(|s| s.as_u16() == 201).count();
    let conflicts = statuses.iter().filter(|s| s.as_u16() == 409).count();
    assert_eq!(successes, 1, "exactly one borrow must win: {:?}", statuses);
    assert_eq!(conflicts, 4, "the rest must conflict: {:?}", statuses);

    let book = get_book(&client, &token, book_id).await;
    assert_eq!(book["quantity"], 0);
}

#[tokio::test]
#[ignore]
async fn test_prebook_requires_verification_and_stock() {
    let client = Client::new();
    let staff = staff_token();

    let book_id = create_book(&client, &staff, 1).await;
    let (member_id, email) = create_verified_member(&client, &staff).await;
    let member = token_for(member_id as i32, &email, Role::Member);

    // Pre-book succeeds while a copy is on shelf
    let response = client
        .post(format!("{}/prebook/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to pre-book");
    assert_eq!(response.status(), 201);

    // A second reservation by the same member conflicts
    let response = client
        .post(format!("{}/prebook/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // One active reservation on quantity=1 means fully reserved for others
    let (other_id, other_email) = create_verified_member(&client, &staff).await;
    let other = token_for(other_id as i32, &other_email, Role::Member);
    let response = client
        .post(format!("{}/prebook/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Converting the reservation via record-borrow consumes it
    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to record borrow");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/prebook/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to get queue");
    let queue: Value = response.json().await.expect("Failed to parse queue");
    assert_eq!(queue.as_array().expect("queue is an array").len(), 0);

    // Out of stock now: pre-booking is rejected outright
    let response = client
        .post(format!("{}/prebook/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_admin_decrement_floors_at_zero_and_respects_reservations() {
    let client = Client::new();
    let staff = staff_token();

    let book_id = create_book(&client, &staff, 1).await;
    let (member_id, email) = create_verified_member(&client, &staff).await;
    let member = token_for(member_id as i32, &email, Role::Member);

    // Reserve the only copy
    let response = client
        .post(format!("{}/prebook/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to pre-book");
    assert_eq!(response.status(), 201);

    // Decrementing would leave more reservations than copies
    let response = client
        .put(format!("{}/book/admin/decrement/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Increment then decrement round-trips
    let response = client
        .put(format!("{}/book/admin/increment/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to increment");
    assert!(response.status().is_success());

    let response = client
        .put(format!("{}/book/admin/decrement/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to decrement");
    assert!(response.status().is_success());

    let book = get_book(&client, &staff, book_id).await;
    assert_eq!(book["quantity"], 1);
    assert_eq!(book["total_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_book_blocked_by_loan_history() {
    let client = Client::new();
    let staff = staff_token();

    let book_id = create_book(&client, &staff, 1).await;
    let (_, email) = create_verified_member(&client, &staff).await;

    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to record borrow");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrow");
    let loan_id = body["loan_id"].as_i64().expect("No loan ID");

    let response = client
        .put(format!("{}/borrow/return-borrowed-book/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to return");
    assert!(response.status().is_success());

    // Loan records are never deleted, so the book cannot be removed even
    // after the loan is closed
    let response = client
        .delete(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // A book with no loan history deletes cleanly
    let fresh_id = create_book(&client, &staff, 1).await;
    let response = client
        .delete(format!("{}/book/{}", BASE_URL, fresh_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to delete book");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_return_someone_elses_loan() {
    let client = Client::new();
    let staff = staff_token();

    let book_id = create_book(&client, &staff, 1).await;
    let (_, email) = create_verified_member(&client, &staff).await;

    let response = client
        .post(format!("{}/borrow/record-borrow-book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to record borrow");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrow");
    let loan_id = body["loan_id"].as_i64().expect("No loan ID");

    let (intruder_id, intruder_email) = create_verified_member(&client, &staff).await;
    let intruder = token_for(intruder_id as i32, &intruder_email, Role::Member);

    let response = client
        .put(format!("{}/borrow/return-borrowed-book/{}", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", intruder))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}
