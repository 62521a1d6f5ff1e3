//! Cart lifecycle and order placement.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use ellectra_integration_tests::{API, TestApp, decimal};

/// Create a category with one product per `(name, price)` and return the
/// product ids.
async fn stock(app: &TestApp, products: &[(&str, &str)]) -> Vec<String> {
    let admin = app.admin_token().await.unwrap();
    let category = app
        .post(
            "/admin/operation/categories",
            Some(&admin),
            json!({"cat_name": "Components", "cat_img": "https://cdn.test/c.png"}),
        )
        .await;
    let cat_id = category.body["category"]["cat_id"].clone();

    let mut ids = Vec::new();
    for (name, price) in products {
        let response = app
            .post(
                "/admin/operation/products",
                Some(&admin),
                json!({
                    "cat_id": cat_id,
                    "product_name": name,
                    "product_description": "Genuine part with datasheet",
                    "price": price,
                    "product_img": "https://cdn.test/p.png",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        ids.push(response.body["product"]["pro_id"].as_str().unwrap().to_owned());
    }
    ids
}

async fn place(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app.post("/past_order/add", Some(token), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["order"].clone()
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_empty_cart_message() {
    let app = TestApp::new();
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let response = app.get("/cart/view", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Your cart is empty");
    assert_eq!(response.body["cart"], json!([]));
}

#[tokio::test]
async fn test_adding_same_product_merges_lines() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Breadboard 830", "100")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let first = app
        .post("/cart/add", Some(&token), json!({"pro_id": ids[0], "quantity": 2}))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post("/cart/add", Some(&token), json!({"pro_id": ids[0], "quantity": 3}))
        .await;
    assert_eq!(second.body["cart_item"]["quantity"], 5);
    assert_eq!(decimal(&second.body["cart_item"]["total_price"]), Decimal::from(500));

    let cart = app.get("/cart/view", Some(&token)).await;
    assert!(cart.body.get("message").is_none());
    let lines = cart.body["cart"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_name"], "Breadboard 830");
}

#[tokio::test]
async fn test_cart_rejects_bad_quantities_and_unknown_products() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Jumper Wires", "45")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let zero = app
        .post("/cart/add", Some(&token), json!({"pro_id": ids[0], "quantity": 0}))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post("/cart/add", Some(&token), json!({"pro_id": "PRO-NOPE", "quantity": 1}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_update_and_delete_are_scoped_to_owner() {
    let app = TestApp::new();
    let ids = stock(&app, &[("LED Pack", "12.50")]).await;
    let owner = app.login("arul@example.com", "Arul").await.unwrap();
    let other = app.login("meena@example.com", "Meena").await.unwrap();

    let added = app
        .post("/cart/add", Some(&owner), json!({"pro_id": ids[0], "quantity": 1}))
        .await;
    let cart_id = added.body["cart_item"]["cart_id"].as_str().unwrap().to_owned();

    let foreign = app
        .put(&format!("/cart/update/{cart_id}"), Some(&other), json!({"quantity": 9}))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let updated = app
        .put(&format!("/cart/update/{cart_id}"), Some(&owner), json!({"quantity": 4}))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(decimal(&updated.body["cart_item"]["total_price"]), Decimal::from(50));

    let foreign_delete = app.delete(&format!("/cart/delete/{cart_id}"), Some(&other)).await;
    assert_eq!(foreign_delete.status, StatusCode::NOT_FOUND);

    let deleted = app.delete(&format!("/cart/delete/{cart_id}"), Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let cart = app.get("/cart/view", Some(&owner)).await;
    assert_eq!(cart.body["cart"], json!([]));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_order_totals_are_computed_and_cart_is_cleared() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Multimeter", "50"), ("Solder Wire", "25")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    for id in &ids {
        app.post("/cart/add", Some(&token), json!({"pro_id": id, "quantity": 1}))
            .await;
    }

    let order = place(
        &app,
        &token,
        json!({
            "items": [
                {"pro_id": ids[0], "quantity": 1},
                {"pro_id": ids[1], "quantity": 2},
            ],
            "delivery_address": "12 Anna Salai",
            "city": "Chennai",
            "pincode": "600002",
            "total_amount": "1.00",
        }),
    )
    .await;
    assert_eq!(decimal(&order["total_amount"]), Decimal::from(100));
    assert_eq!(order["payment_status"], "Pending");
    assert_eq!(order["status"], "Pending");

    let cart = app.get("/cart/view", Some(&token)).await;
    assert_eq!(cart.body["cart"], json!([]));

    let order_id = order["order_id"].as_str().unwrap();
    let detail = app.get(&format!("/past_order/view/{order_id}"), Some(&token)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["user_email"], "arul@example.com");
    assert_eq!(detail.body["items"][1]["product_name"], "Solder Wire");
    assert_eq!(decimal(&detail.body["items"][1]["item_total"]), Decimal::from(50));
}

#[tokio::test]
async fn test_order_rejects_empty_and_unknown_items() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Capacitor Kit", "80")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let empty = app.post("/past_order/add", Some(&token), json!({"items": []})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post(
            "/past_order/add",
            Some(&token),
            json!({"items": [
                {"pro_id": ids[0], "quantity": 1},
                {"pro_id": "PRO-GONE", "quantity": 1},
            ]}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let history = app.get("/past_order/view", Some(&token)).await;
    assert_eq!(history.body["total_count"], 0);
}

#[tokio::test]
async fn test_status_update_requires_a_field() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Oscilloscope Probe", "900")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let order_id = order["order_id"].as_str().unwrap();

    let empty = app
        .patch(&format!("/past_order/update-status/{order_id}"), Some(&token), json!({}))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let updated = app
        .patch(
            &format!("/past_order/update-status/{order_id}"),
            Some(&token),
            json!({"status": "Out for Delivery", "payment_status": "Successfully"}),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["order"]["status"], "Out for Delivery");
    assert_eq!(updated.body["order"]["payment_status"], "Successfully");
}

#[tokio::test]
async fn test_delivery_edit_only_while_pending() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Heat Shrink Set", "70")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let order_id = order["order_id"].as_str().unwrap();

    let edited = app
        .put(
            &format!("/past_order/update/{order_id}"),
            Some(&token),
            json!({"city": "Madurai", "pincode": "625001"}),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["order"]["city"], "Madurai");

    app.patch(
        &format!("/past_order/update-status/{order_id}"),
        Some(&token),
        json!({"status": "Delivered"}),
    )
    .await;

    let locked = app
        .put(
            &format!("/past_order/update/{order_id}"),
            Some(&token),
            json!({"city": "Coimbatore"}),
        )
        .await;
    assert_eq!(locked.status, StatusCode::CONFLICT);
    assert_eq!(locked.body["message"], "Order cannot be modified");
}

#[tokio::test]
async fn test_orders_are_private_to_their_owner() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Logic Analyzer", "1200")]).await;
    let owner = app.login("arul@example.com", "Arul").await.unwrap();
    let other = app.login("meena@example.com", "Meena").await.unwrap();
    let order = place(&app, &owner, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let order_id = order["order_id"].as_str().unwrap();

    let peek = app.get(&format!("/past_order/view/{order_id}"), Some(&other)).await;
    assert_eq!(peek.status, StatusCode::NOT_FOUND);

    let steal = app.delete(&format!("/past_order/delete/{order_id}"), Some(&other)).await;
    assert_eq!(steal.status, StatusCode::NOT_FOUND);

    let deleted = app.delete(&format!("/past_order/delete/{order_id}"), Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::OK);
}

#[tokio::test]
async fn test_history_filter_and_stats() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Soldering Station", "2000"), ("Flux Pen", "150")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let first = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    place(&app, &token, json!({"items": [{"pro_id": ids[1], "quantity": 2}]})).await;
    let first_id = first["order_id"].as_str().unwrap();
    app.patch(
        &format!("/past_order/update-status/{first_id}"),
        Some(&token),
        json!({"status": "Delivered"}),
    )
    .await;

    let all = app.get("/past_order/view", Some(&token)).await;
    assert_eq!(all.body["total_count"], 2);

    let delivered = app
        .get("/past_order/view?status=Delivered", Some(&token))
        .await;
    assert_eq!(delivered.status, StatusCode::OK);
    assert_eq!(delivered.body["total_count"], 1);
    assert_eq!(delivered.body["items"][0]["order_id"], first_id);

    let stats = app.get("/past_order/stats", Some(&token)).await;
    assert_eq!(stats.body["total_orders"], 2);
    assert_eq!(decimal(&stats.body["total_amount"]), Decimal::from(2300));
}

#[tokio::test]
async fn test_status_options() {
    let app = TestApp::new();
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let response = app.get("/past_order/status-options", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["payment_status_options"],
        json!(["Pending", "Successfully"])
    );
    assert_eq!(
        response.body["order_status_options"],
        json!(["Pending", "Out for Delivery", "Delivered"])
    );
}

#[tokio::test]
async fn test_status_update_keeps_the_other_field() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Bench Power Supply", "3500")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let path = format!("/past_order/update-status/{}", order["order_id"].as_str().unwrap());

    let shipped = app
        .patch(&path, Some(&token), json!({"status": "Out for Delivery"}))
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.body["order"]["status"], "Out for Delivery");
    assert_eq!(shipped.body["order"]["payment_status"], "Pending");

    let paid = app
        .patch(&path, Some(&token), json!({"payment_status": "Successfully"}))
        .await;
    assert_eq!(paid.status, StatusCode::OK);
    assert_eq!(paid.body["order"]["payment_status"], "Successfully");
    assert_eq!(paid.body["order"]["status"], "Out for Delivery");
}

// ============================================================================
// Price changes
// ============================================================================

#[tokio::test]
async fn test_repricing_leaves_orders_alone_but_reprices_cart() {
    let app = TestApp::new();
    let ids = stock(&app, &[("Multimeter", "50"), ("Solder Wire", "25")]).await;
    let admin = app.admin_token().await.unwrap();
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let order = place(
        &app,
        &token,
        json!({"items": [
            {"pro_id": ids[0], "quantity": 1},
            {"pro_id": ids[1], "quantity": 2},
        ]}),
    )
    .await;
    let added = app
        .post("/cart/add", Some(&token), json!({"pro_id": ids[1], "quantity": 1}))
        .await;
    let cart_id = added.body["cart_item"]["cart_id"].as_str().unwrap().to_owned();

    let product = app.get(&format!("/products/{}", ids[1]), None).await.body;
    let repriced = app
        .put(
            &format!("/admin/operation/products/{}", ids[1]),
            Some(&admin),
            json!({
                "cat_id": product["cat_id"],
                "product_name": product["product_name"],
                "product_description": product["product_description"],
                "price": "30",
                "product_img": product["product_img"],
            }),
        )
        .await;
    assert_eq!(repriced.status, StatusCode::OK, "{:?}", repriced.body);

    let order_id = order["order_id"].as_str().unwrap();
    let detail = app.get(&format!("/past_order/view/{order_id}"), Some(&token)).await;
    assert_eq!(decimal(&detail.body["items"][1]["price_per_item"]), Decimal::from(25));
    assert_eq!(decimal(&detail.body["items"][1]["item_total"]), Decimal::from(50));
    assert_eq!(decimal(&detail.body["total_amount"]), Decimal::from(100));

    let updated = app
        .put(&format!("/cart/update/{cart_id}"), Some(&token), json!({"quantity": 2}))
        .await;
    assert_eq!(decimal(&updated.body["cart_item"]["total_price"]), Decimal::from(60));
}

// ============================================================================
// Amount limits
// ============================================================================

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let app = TestApp::new();
    let admin = app.admin_token().await.unwrap();
    let ids = stock(&app, &[("Wafer Stepper", "9999999999.99")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let category = app.get("/products/categories/all", None).await.body[0]["cat_id"].clone();
    let huge_price = app
        .post(
            "/admin/operation/products",
            Some(&admin),
            json!({
                "cat_id": category,
                "product_name": "Particle Accelerator",
                "product_description": "Ships in many crates",
                "price": "100000000000000000000",
                "product_img": "https://cdn.test/lhc.png",
            }),
        )
        .await;
    assert_eq!(huge_price.status, StatusCode::BAD_REQUEST);

    let order = app
        .post(
            "/past_order/add",
            Some(&token),
            json!({"items": [{"pro_id": ids[0], "quantity": 4_294_967_295_u64}]}),
        )
        .await;
    assert_eq!(order.status, StatusCode::BAD_REQUEST);
    assert_eq!(order.body["error"], "HTTP 400");

    let cart = app
        .post("/cart/add", Some(&token), json!({"pro_id": ids[0], "quantity": 2}))
        .await;
    assert_eq!(cart.status, StatusCode::BAD_REQUEST);
    assert_eq!(cart.body["path"], format!("{API}/cart/add"));
}
