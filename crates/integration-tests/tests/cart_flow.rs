//! Integration tests for the session cart flow.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p comelones-storefront)
//! - At least one seeded product (cf-cli seed products --file ...)
//!
//! Run with: cargo test -p comelones-integration-tests -- --ignored

use comelones_integration_tests::{session_client, storefront_base_url};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Fetch the first product from the catalog.
async fn first_product(client: &reqwest::Client) -> Value {
    let base_url = storefront_base_url();
    let resp = client
        .get(format!("{base_url}/products"))
        .send()
        .await
        .expect("Failed to fetch products");

    assert_eq!(resp.status(), StatusCode::OK);
    let products: Vec<Value> = resp.json().await.expect("Failed to parse products");
    products.first().cloned().expect("No seeded products")
}

// ============================================================================
// Guest Cart Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_empty_cart_on_first_visit() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["cart"]["item_count"], 0);
    assert!(body["sync_error"].is_null());
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_add_item_accumulates_quantity() {
    let client = session_client();
    let base_url = storefront_base_url();
    let product = first_product(&client).await;
    let product_id = product["id"].as_str().expect("Product has no id");

    // Add the same product twice
    for _ in 0..2 {
        let resp = client
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id }))
            .send()
            .await
            .expect("Failed to add item");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart");
    let body: Value = resp.json().await.expect("Failed to parse cart");

    // One line, quantity two
    let items = body["cart"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(body["cart"]["item_count"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_zero_quantity_removes_line() {
    let client = session_client();
    let base_url = storefront_base_url();
    let product = first_product(&client).await;
    let product_id = product["id"].as_str().expect("Product has no id");

    client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .expect("Failed to add item");

    let resp = client
        .patch(format!("{base_url}/cart/items/{product_id}"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update quantity");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["cart"]["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_remove_unknown_product_is_noop() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .delete(format!("{base_url}/cart/items/not-a-product"))
        .send()
        .await
        .expect("Failed to remove item");

    // Silent no-op, not an error
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["cart"]["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_unknown_product_add_is_404() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "product_id": "definitely-not-in-catalog" }))
        .send()
        .await
        .expect("Failed to post add");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_clear_cart() {
    let client = session_client();
    let base_url = storefront_base_url();
    let product = first_product(&client).await;

    client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("Failed to add item");

    let resp = client
        .delete(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to clear cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["cart"]["item_count"], 0);
    assert!(body["cart"]["items"].as_array().expect("items").is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_guest_cannot_sync() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/cart/sync"))
        .send()
        .await
        .expect("Failed to post sync");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Login Merge Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_guest_cart_survives_login() {
    let client = session_client();
    let base_url = storefront_base_url();
    let product = first_product(&client).await;

    // Fill the guest cart
    client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("Failed to add item");

    // Login as a fresh user with no persisted cart
    let user_id = uuid::Uuid::new_v4().to_string();
    let resp = client
        .post(format!("{base_url}/auth/session"))
        .json(&json!({
            "user_id": user_id,
            "email": format!("{user_id}@comelonesfit.com"),
        }))
        .send()
        .await
        .expect("Failed to login");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse login response");

    // The guest cart wins the merge against the empty remote cart
    assert_eq!(body["cart"]["item_count"], 1);
    assert_eq!(body["user"]["role"], "visitor");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_logout_resets_session_cart() {
    let client = session_client();
    let base_url = storefront_base_url();
    let product = first_product(&client).await;

    let user_id = uuid::Uuid::new_v4().to_string();
    client
        .post(format!("{base_url}/auth/session"))
        .json(&json!({
            "user_id": user_id,
            "email": format!("{user_id}@comelonesfit.com"),
        }))
        .send()
        .await
        .expect("Failed to login");

    client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("Failed to add item");

    let resp = client
        .delete(format!("{base_url}/auth/session"))
        .send()
        .await
        .expect("Failed to logout");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart");
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["cart"]["item_count"], 0);
}
