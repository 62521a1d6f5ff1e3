//! The storefront router against a real `PostgreSQL` database.
//!
//! Each test migrates a private schema, so tests can run in parallel against
//! one database. Set `ELLECTRA_DATABASE_URL` (or `DATABASE_URL`) and run with
//! `--ignored`.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::Executor;
use sqlx::postgres::{PgPool, PgPoolOptions};

use ellectra_integration_tests::{TestApp, decimal};
use ellectra_storefront::db::PgStore;

static NEXT_SCHEMA: AtomicUsize = AtomicUsize::new(0);

fn database_url() -> String {
    std::env::var("ELLECTRA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap()
}

/// Connect with `search_path` pinned to a freshly migrated schema.
async fn isolated_pool() -> PgPool {
    let schema = format!(
        "ellectra_test_{}_{}",
        std::process::id(),
        NEXT_SCHEMA.fetch_add(1, Ordering::Relaxed)
    );

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url())
        .await
        .unwrap();
    sqlx::raw_sql(&format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
    ))
    .execute(&admin)
    .await
    .unwrap();
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .after_connect(move |conn, _meta| {
            let set_path = format!("SET search_path TO {schema}");
            Box::pin(async move {
                conn.execute(set_path.as_str()).await?;
                Ok(())
            })
        })
        .connect(&database_url())
        .await
        .unwrap();
    sqlx::migrate!("../storefront/migrations").run(&pool).await.unwrap();
    pool
}

async fn pg_app() -> (TestApp<PgStore>, PgPool) {
    let pool = isolated_pool().await;
    (TestApp::with_store(PgStore::new(pool.clone())), pool)
}

async fn stock(app: &TestApp<PgStore>, category: &str, products: &[(&str, &str)]) -> (String, Vec<String>) {
    let admin = app.admin_token().await.unwrap();
    let created = app
        .post(
            "/admin/operation/categories",
            Some(&admin),
            json!({"cat_name": category, "cat_img": "https://cdn.test/c.png"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let cat_id = created.body["category"]["cat_id"].as_str().unwrap().to_owned();

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
    (cat_id, ids)
}

async fn place(app: &TestApp<PgStore>, token: &str, body: Value) -> Value {
    let response = app.post("/past_order/add", Some(token), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["order"].clone()
}

// ============================================================================
// Order placement
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_placing_order_clears_only_ordered_cart_lines() {
    let (app, _pool) = pg_app().await;
    let (_, ids) = stock(&app, "Test Gear", &[("Multimeter", "50"), ("Test Clips", "25")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    for id in &ids {
        app.post("/cart/add", Some(&token), json!({"pro_id": id, "quantity": 1}))
            .await;
    }

    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 2}]})).await;
    assert_eq!(decimal(&order["total_amount"]), Decimal::from(100));

    let cart = app.get("/cart/view", Some(&token)).await;
    let lines = cart.body["cart"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_id"], ids[1].as_str());

    let detail = app
        .get(&format!("/past_order/view/{}", order["order_id"].as_str().unwrap()), Some(&token))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(decimal(&detail.body["items"][0]["item_total"]), Decimal::from(100));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_failed_cart_cleanup_rolls_back_the_order() {
    let (app, pool) = pg_app().await;
    let (_, ids) = stock(&app, "Test Gear", &[("Multimeter", "50")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    app.post("/cart/add", Some(&token), json!({"pro_id": ids[0], "quantity": 1}))
        .await;

    sqlx::raw_sql(
        "CREATE FUNCTION refuse_cart_delete() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'cart lines are locked'; END $$ LANGUAGE plpgsql; \
         CREATE TRIGGER cart_lines_locked BEFORE DELETE ON cart_lines \
         FOR EACH ROW EXECUTE FUNCTION refuse_cart_delete();",
    )
    .execute(&pool)
    .await
    .unwrap();

    let response = app
        .post(
            "/past_order/add",
            Some(&token),
            json!({"items": [{"pro_id": ids[0], "quantity": 1}]}),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    let history = app.get("/past_order/view", Some(&token)).await;
    assert_eq!(history.body["total_count"], 0);

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);

    let cart = app.get("/cart/view", Some(&token)).await;
    assert_eq!(cart.body["cart"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_largest_total_fits_the_column() {
    let (app, _pool) = pg_app().await;
    let (_, ids) = stock(&app, "Fab Equipment", &[("Wafer Stepper", "9999999999.99")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    assert_eq!(order["total_amount"], "9999999999.99");

    let too_many = app
        .post(
            "/past_order/add",
            Some(&token),
            json!({"items": [{"pro_id": ids[0], "quantity": 2}]}),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Order updates
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_delivery_edit_is_locked_after_dispatch() {
    let (app, _pool) = pg_app().await;
    let (_, ids) = stock(&app, "Test Gear", &[("Heat Shrink Set", "70")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let order_id = order["order_id"].as_str().unwrap();

    let edited = app
        .put(
            &format!("/past_order/update/{order_id}"),
            Some(&token),
            json!({"city": "Madurai"}),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["order"]["city"], "Madurai");

    let shipped = app
        .patch(
            &format!("/past_order/update-status/{order_id}"),
            Some(&token),
            json!({"status": "Out for Delivery"}),
        )
        .await;
    assert_eq!(shipped.body["order"]["payment_status"], "Pending");

    let locked = app
        .put(
            &format!("/past_order/update/{order_id}"),
            Some(&token),
            json!({"city": "Coimbatore"}),
        )
        .await;
    assert_eq!(locked.status, StatusCode::CONFLICT);

    let detail = app.get(&format!("/past_order/view/{order_id}"), Some(&token)).await;
    assert_eq!(detail.body["city"], "Madurai");
    assert_eq!(detail.body["status"], "Out for Delivery");
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_order_snapshot_survives_repricing() {
    let (app, _pool) = pg_app().await;
    let (cat_id, ids) = stock(&app, "Test Gear", &[("Solder Wire", "25")]).await;
    let admin = app.admin_token().await.unwrap();
    let token = app.login("arul@example.com", "Arul").await.unwrap();
    let order = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 2}]})).await;

    let repriced = app
        .put(
            &format!("/admin/operation/products/{}", ids[0]),
            Some(&admin),
            json!({
                "cat_id": cat_id,
                "product_name": "Solder Wire",
                "product_description": "Genuine part with datasheet",
                "price": "40",
                "product_img": "https://cdn.test/p.png",
            }),
        )
        .await;
    assert_eq!(repriced.status, StatusCode::OK);

    let order_id = order["order_id"].as_str().unwrap();
    let detail = app.get(&format!("/past_order/view/{order_id}"), Some(&token)).await;
    assert_eq!(decimal(&detail.body["items"][0]["price_per_item"]), Decimal::from(25));
    assert_eq!(decimal(&detail.body["total_amount"]), Decimal::from(50));
}

// ============================================================================
// Catalog and stats
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_category_delete_counts_cascaded_products() {
    let (app, _pool) = pg_app().await;
    let admin = app.admin_token().await.unwrap();
    let (cat_id, _) = stock(
        &app,
        "Motors",
        &[("Servo SG90", "150"), ("Stepper 28BYJ", "150"), ("DC Gear Motor", "150")],
    )
    .await;
    stock(&app, "Displays", &[("OLED 0.96", "300")]).await;

    let deleted = app
        .delete(&format!("/admin/operation/categories/{cat_id}"), Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["deleted_products_count"], 3);

    let products = app.get("/products", None).await;
    assert_eq!(products.body["total_count"], 1);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_stats_groups_follow_fulfillment_order() {
    let (app, _pool) = pg_app().await;
    let (_, ids) = stock(&app, "Test Gear", &[("Soldering Station", "2000"), ("Flux Pen", "150")]).await;
    let token = app.login("arul@example.com", "Arul").await.unwrap();

    let delivered = place(&app, &token, json!({"items": [{"pro_id": ids[0], "quantity": 1}]})).await;
    let shipped = place(&app, &token, json!({"items": [{"pro_id": ids[1], "quantity": 1}]})).await;
    place(&app, &token, json!({"items": [{"pro_id": ids[1], "quantity": 2}]})).await;
    for (order, status) in [(&delivered, "Delivered"), (&shipped, "Out for Delivery")] {
        app.patch(
            &format!("/past_order/update-status/{}", order["order_id"].as_str().unwrap()),
            Some(&token),
            json!({"status": status}),
        )
        .await;
    }

    let stats = app.get("/past_order/stats", Some(&token)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["total_orders"], 3);
    assert_eq!(decimal(&stats.body["total_amount"]), Decimal::from(2450));

    let statuses: Vec<&str> = stats.body["by_status"]
        .as_array()
        .unwrap()
        .iter()
        .map(|group| group["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, ["Pending", "Out for Delivery", "Delivered"]);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_search_matches_wildcards_literally() {
    let (app, _pool) = pg_app().await;
    stock(
        &app,
        "Power",
        &[("Battery 100% Tested", "90"), ("Battery Holder", "20"), ("Fuse_5A", "5")],
    )
    .await;

    let percent = app.get("/products/search?q=100%25", None).await;
    assert_eq!(percent.status, StatusCode::OK);
    assert_eq!(percent.body["count"], 1);

    let spanning_percent = app.get("/products/search?q=y%25H", None).await;
    assert_eq!(spanning_percent.body["count"], 0);

    let underscore = app.get("/products/search?q=y_H", None).await;
    assert_eq!(underscore.body["count"], 0);

    let literal_underscore = app.get("/products/search?q=e_5", None).await;
    assert_eq!(literal_underscore.body["count"], 1);

    let caseless = app.get("/products/search?q=BATTERY", None).await;
    assert_eq!(caseless.body["count"], 2);
}
